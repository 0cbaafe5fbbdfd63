use log::warn;

use super::error::OpticsError;
use super::spectrum::Spectrum;

/// Raw counts of a light source as measured, before any normalization.
///
/// Negative counts (detector offset) are clamped to zero on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpectrum {
    pub name: String,
    counts: Spectrum,
}

impl SourceSpectrum {
    pub fn new(
        name: impl Into<String>,
        wavelengths: Vec<f64>,
        counts: Vec<f64>,
    ) -> Result<Self, OpticsError> {
        let name = name.into();
        if wavelengths.len() != counts.len() {
            return Err(OpticsError::data_format(format!(
                "light source '{name}': {} wavelengths but {} counts",
                wavelengths.len(),
                counts.len()
            )));
        }
        if let Some(i) = counts.iter().position(|c| !c.is_finite()) {
            return Err(OpticsError::data_format(format!(
                "light source '{name}': non-finite count at {} nm",
                wavelengths[i]
            )));
        }

        let clamped = counts.iter().filter(|&&c| c < 0.0).count();
        if clamped > 0 {
            warn!("light source '{name}': clamped {clamped} negative counts to zero");
        }
        let counts = Spectrum::new(wavelengths, counts.into_iter().map(|c| c.max(0.0)).collect())
            .map_err(|e| match e {
                OpticsError::DataFormat(msg) => {
                    OpticsError::data_format(format!("light source '{name}': {msg}"))
                }
                other => other,
            })?;

        if counts.max_weight() <= 0.0 {
            return Err(OpticsError::data_format(format!(
                "light source '{name}' has no positive counts"
            )));
        }

        Ok(SourceSpectrum { name, counts })
    }

    pub fn wavelengths(&self) -> &[f64] {
        self.counts.wavelengths()
    }

    pub fn counts(&self) -> &[f64] {
        self.counts.weights()
    }

    /// Counts divided by their maximum (peak = 1), for display.
    pub fn max_normalized(&self) -> Spectrum {
        let factor = 1.0 / self.counts.max_weight();
        self.counts.map_weights(|_, c| c * factor)
    }

    /// Counts divided by their sum (total = 1), for power calculation.
    pub fn sum_normalized(&self) -> Spectrum {
        let factor = 1.0 / self.counts.total_weight();
        self.counts.map_weights(|_, c| c * factor)
    }
}
