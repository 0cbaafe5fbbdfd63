use super::error::{OpticsError, ensure_strictly_increasing};

/// A wavelength-indexed series of non-negative intensity weights.
///
/// Wavelengths (nm) are strictly increasing; `weights` has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelengths: Vec<f64>,
    weights: Vec<f64>,
}

impl Spectrum {
    pub fn new(wavelengths: Vec<f64>, weights: Vec<f64>) -> Result<Self, OpticsError> {
        if wavelengths.len() != weights.len() {
            return Err(OpticsError::data_format(format!(
                "spectrum: {} wavelengths but {} weights",
                wavelengths.len(),
                weights.len()
            )));
        }
        ensure_strictly_increasing(&wavelengths, "spectrum")?;
        if wavelengths.first().is_some_and(|&w| w <= 0.0) {
            return Err(OpticsError::data_format(
                "spectrum: wavelengths must be positive",
            ));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(OpticsError::data_format(format!(
                "spectrum: weight {} at {} nm is negative or non-finite",
                weights[i], wavelengths[i]
            )));
        }
        Ok(Spectrum {
            wavelengths,
            weights,
        })
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// `(wavelength, weight)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
    }

    /// Same wavelengths, each weight passed through `f(index, weight)`.
    ///
    /// Callers keep weights non-negative (attenuation and falloff only scale
    /// by non-negative factors).
    pub(crate) fn map_weights(&self, mut f: impl FnMut(usize, f64) -> f64) -> Spectrum {
        Spectrum {
            wavelengths: self.wavelengths.clone(),
            weights: self
                .weights
                .iter()
                .enumerate()
                .map(|(i, &w)| f(i, w))
                .collect(),
        }
    }

    pub fn max_weight(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}
