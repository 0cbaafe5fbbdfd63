use std::fmt;

use log::debug;

use super::error::{OpticsError, ensure_strictly_increasing};
use super::spline::CubicSpline;

// ---------------------------------------------------------------------------
// Reference grid and constants
// ---------------------------------------------------------------------------

/// First wavelength (nm) of the reference grid.
pub const REFERENCE_GRID_START_NM: f64 = 300.0;
/// Spacing (nm) of the reference grid.
pub const REFERENCE_GRID_STEP_NM: f64 = 0.2;
/// Number of reference grid points: 300.0, 300.2, … 1199.8.
pub const REFERENCE_GRID_LEN: usize = 4500;

/// Constant transmission of the synthetic lossless fiber.
pub const FIBER_TRANSMISSION: f64 = 0.98;

/// Floor applied to interpolated transmission so its optical density stays
/// finite (OD 10).
pub const MIN_TRANSMISSION: f64 = 1e-10;

/// The dense wavelength grid synthetic and sparse curves are sampled on.
pub fn reference_grid() -> Vec<f64> {
    (0..REFERENCE_GRID_LEN)
        .map(|i| REFERENCE_GRID_START_NM + i as f64 * REFERENCE_GRID_STEP_NM)
        .collect()
}

/// Optical density of a transmission fraction: `log10(1 / t)`.
pub fn optical_density(transmission: f64) -> f64 {
    (1.0 / transmission).log10()
}

// ---------------------------------------------------------------------------
// ElementKind
// ---------------------------------------------------------------------------

/// The closed set of element categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Synthetic fiber: constant transmission, OD scaled by fiber length.
    Fiber,
    /// Filter described by vendor transmission data.
    Filter,
}

impl ElementKind {
    /// Multiplier on the optical density when attenuating through this kind.
    ///
    /// Only a fiber's loss grows with its length.
    pub fn od_scale(self, fiber_length: f64) -> f64 {
        match self {
            ElementKind::Fiber => fiber_length,
            ElementKind::Filter => 1.0,
        }
    }

    /// Whether the curve is generated rather than read from vendor data.
    pub fn is_synthetic(self) -> bool {
        matches!(self, ElementKind::Fiber)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Fiber => write!(f, "fiber"),
            ElementKind::Filter => write!(f, "filter"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw vendor data
// ---------------------------------------------------------------------------

/// Unit of the transmission column in raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionScale {
    /// 0–100.
    Percent,
    /// 0–1.
    Fraction,
}

impl TransmissionScale {
    pub fn to_fraction(self, value: f64) -> f64 {
        match self {
            TransmissionScale::Percent => value / 100.0,
            TransmissionScale::Fraction => value,
        }
    }
}

/// How raw rows become curve samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLayout {
    /// Coarse pairs, spline-resampled onto the reference grid.
    Sparse,
    /// Rows used verbatim.
    Dense,
}

/// One parsed row of vendor data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRow {
    pub wavelength: f64,
    pub transmission: f64,
    /// Present only when the vendor file carries an OD column.
    pub optical_density: Option<f64>,
}

/// Vendor curve data as handed over by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurve {
    pub layout: RawLayout,
    pub scale: TransmissionScale,
    pub rows: Vec<RawRow>,
}

#[cfg(test)]
impl RawCurve {
    /// Sparse `(wavelength, transmission)` pairs.
    pub fn sparse(scale: TransmissionScale, pairs: &[(f64, f64)]) -> Self {
        RawCurve {
            layout: RawLayout::Sparse,
            scale,
            rows: pairs
                .iter()
                .map(|&(wavelength, transmission)| RawRow {
                    wavelength,
                    transmission,
                    optical_density: None,
                })
                .collect(),
        }
    }

    /// Dense rows, taken verbatim.
    pub fn dense(scale: TransmissionScale, rows: Vec<RawRow>) -> Self {
        RawCurve {
            layout: RawLayout::Dense,
            scale,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// SpectralCurve
// ---------------------------------------------------------------------------

/// One sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub wavelength: f64,
    pub transmission: f64,
    pub optical_density: f64,
}

/// Per-wavelength values produced by [`SpectralCurve::resample`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resampled {
    pub transmission: Vec<f64>,
    pub optical_density: Vec<f64>,
}

/// Transmission / optical density of one element as a function of wavelength.
///
/// Samples are strictly increasing in wavelength. A curve never changes once
/// built; resampling returns fresh arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralCurve {
    kind: ElementKind,
    samples: Vec<CurveSample>,
}

impl SpectralCurve {
    /// Build the curve for an element of `kind`.
    ///
    /// A fiber ignores `raw` and is generated on the reference grid. A filter
    /// requires raw data: sparse rows are spline-resampled onto the reference
    /// grid with OD computed from the interpolated transmission, dense rows
    /// are kept as they are.
    pub fn build(kind: ElementKind, raw: Option<&RawCurve>) -> Result<Self, OpticsError> {
        match (kind, raw) {
            (ElementKind::Fiber, raw) => {
                if raw.is_some() {
                    debug!("fiber curve is synthetic; ignoring supplied raw data");
                }
                Ok(Self::fiber())
            }
            (ElementKind::Filter, None) => Err(OpticsError::data_format(
                "a filter needs raw transmission data",
            )),
            (ElementKind::Filter, Some(raw)) => {
                let rows = normalized_rows(raw)?;
                let samples = match raw.layout {
                    RawLayout::Sparse => sparse_to_grid(&rows)?,
                    RawLayout::Dense => dense_samples(&rows),
                };
                debug!(
                    "built {kind} curve: {} samples over [{}, {}] nm",
                    samples.len(),
                    samples[0].wavelength,
                    samples[samples.len() - 1].wavelength
                );
                Ok(SpectralCurve { kind, samples })
            }
        }
    }

    /// The lossless fiber: constant 0.98 over the reference grid.
    pub fn fiber() -> Self {
        let od = optical_density(FIBER_TRANSMISSION);
        let samples = reference_grid()
            .into_iter()
            .map(|wavelength| CurveSample {
                wavelength,
                transmission: FIBER_TRANSMISSION,
                optical_density: od,
            })
            .collect();
        SpectralCurve {
            kind: ElementKind::Fiber,
            samples,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn samples(&self) -> &[CurveSample] {
        &self.samples
    }

    /// Native wavelength domain `[λmin, λmax]`.
    pub fn domain(&self) -> (f64, f64) {
        // Construction guarantees at least two samples.
        (
            self.samples[0].wavelength,
            self.samples[self.samples.len() - 1].wavelength,
        )
    }

    /// Samples with `lo ≤ λ ≤ hi`, for tabular display.
    pub fn window(&self, lo: f64, hi: f64) -> &[CurveSample] {
        let start = self.samples.partition_point(|s| s.wavelength < lo);
        let end = self.samples.partition_point(|s| s.wavelength <= hi);
        if start >= end {
            &[]
        } else {
            &self.samples[start..end]
        }
    }

    /// Evaluate transmission and OD at every wavelength of `targets`.
    ///
    /// The curve is cut to the overlap with `[min(targets), max(targets)]`.
    /// Where the targets run past the native domain a zero anchor
    /// (T = 0, OD = 0) is placed at the target extreme, so light outside the
    /// measured range is dropped instead of extrapolated. Both quantities are
    /// spline-interpolated through the knots and clamped to their physical
    /// ranges (T in [0, 1], OD ≥ 0).
    pub fn resample(&self, targets: &[f64]) -> Result<Resampled, OpticsError> {
        if targets.is_empty() {
            return Ok(Resampled::default());
        }
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(OpticsError::data_format(
                "resample: non-finite target wavelength",
            ));
        }

        let t_min = targets.iter().copied().fold(f64::INFINITY, f64::min);
        let t_max = targets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (c_min, c_max) = self.domain();

        // No overlap at all: nothing passes.
        if t_max < c_min || t_min > c_max {
            return Ok(Resampled {
                transmission: vec![0.0; targets.len()],
                optical_density: vec![0.0; targets.len()],
            });
        }

        let pad_low = t_min < c_min;
        let pad_high = t_max > c_max;

        let mut lo = self.samples.partition_point(|s| s.wavelength < t_min);
        let mut hi = self.samples.partition_point(|s| s.wavelength <= t_max);

        // A target range narrower than the sample spacing still needs two
        // knots; borrow the neighbouring samples.
        if hi - lo + usize::from(pad_low) + usize::from(pad_high) < 2 {
            if !pad_low {
                lo = lo.saturating_sub(1);
            }
            if !pad_high {
                hi = (hi + 1).min(self.samples.len());
            }
        }

        let n_knots = hi - lo + usize::from(pad_low) + usize::from(pad_high);
        let mut xs = Vec::with_capacity(n_knots);
        let mut ts = Vec::with_capacity(n_knots);
        let mut ods = Vec::with_capacity(n_knots);

        if pad_low {
            xs.push(t_min);
            ts.push(0.0);
            ods.push(0.0);
        }
        for s in &self.samples[lo..hi] {
            xs.push(s.wavelength);
            ts.push(s.transmission);
            ods.push(s.optical_density);
        }
        if pad_high {
            xs.push(t_max);
            ts.push(0.0);
            ods.push(0.0);
        }

        let t_spline = CubicSpline::new(xs.clone(), ts)?;
        let od_spline = CubicSpline::new(xs, ods)?;

        Ok(Resampled {
            transmission: targets
                .iter()
                .map(|&w| t_spline.evaluate(w).clamp(0.0, 1.0))
                .collect(),
            optical_density: targets
                .iter()
                .map(|&w| od_spline.evaluate(w).max(0.0))
                .collect(),
        })
    }
}

/// Validate raw rows and convert transmission to a fraction.
fn normalized_rows(raw: &RawCurve) -> Result<Vec<RawRow>, OpticsError> {
    if raw.rows.len() < 2 {
        return Err(OpticsError::data_format(format!(
            "need at least 2 rows of curve data, got {}",
            raw.rows.len()
        )));
    }
    let wavelengths: Vec<f64> = raw.rows.iter().map(|r| r.wavelength).collect();
    ensure_strictly_increasing(&wavelengths, "curve data")?;

    raw.rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let transmission = raw.scale.to_fraction(row.transmission);
            if transmission.is_nan() || transmission <= 0.0 {
                return Err(OpticsError::data_format(format!(
                    "row {i}: transmission {} at {} nm is not positive",
                    row.transmission, row.wavelength
                )));
            }
            if transmission > 1.0 {
                return Err(OpticsError::data_format(format!(
                    "row {i}: transmission {} at {} nm exceeds 100%",
                    row.transmission, row.wavelength
                )));
            }
            if let Some(od) = row.optical_density {
                if !od.is_finite() || od < 0.0 {
                    return Err(OpticsError::data_format(format!(
                        "row {i}: optical density {od} at {} nm is invalid",
                        row.wavelength
                    )));
                }
            }
            Ok(RawRow {
                transmission,
                ..*row
            })
        })
        .collect()
}

/// Spline sparse rows onto the part of the reference grid they cover.
fn sparse_to_grid(rows: &[RawRow]) -> Result<Vec<CurveSample>, OpticsError> {
    let lo = rows[0].wavelength;
    let hi = rows[rows.len() - 1].wavelength;
    let grid: Vec<f64> = reference_grid()
        .into_iter()
        .filter(|&w| w >= lo && w <= hi)
        .collect();
    if grid.is_empty() {
        return Err(OpticsError::data_format(format!(
            "curve data [{lo}, {hi}] nm covers no reference grid point"
        )));
    }

    let spline = CubicSpline::new(
        rows.iter().map(|r| r.wavelength).collect(),
        rows.iter().map(|r| r.transmission).collect(),
    )?;
    let interpolated = spline.evaluate_all(&grid);

    Ok(grid
        .into_iter()
        .zip(interpolated)
        .map(|(wavelength, t)| {
            let transmission = t.clamp(MIN_TRANSMISSION, 1.0);
            CurveSample {
                wavelength,
                transmission,
                optical_density: optical_density(transmission),
            }
        })
        .collect())
}

fn dense_samples(rows: &[RawRow]) -> Vec<CurveSample> {
    rows
        .iter()
        .map(|r| CurveSample {
            wavelength: r.wavelength,
            transmission: r.transmission,
            optical_density: r
                .optical_density
                .unwrap_or_else(|| optical_density(r.transmission)),
        })
        .collect()
}
