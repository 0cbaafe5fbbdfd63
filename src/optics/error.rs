use thiserror::Error;

/// Errors raised by the optics core.
///
/// Every operation that returns one of these leaves its inputs (curve, chain,
/// session) untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpticsError {
    /// Curve or spectrum data that cannot be modelled: non-monotonic
    /// wavelengths, non-positive transmission, mismatched column counts.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A control parameter outside its legal range (e.g. distance ≤ 0).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl OpticsError {
    pub(crate) fn data_format(msg: impl Into<String>) -> Self {
        OpticsError::DataFormat(msg.into())
    }

    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        OpticsError::InvalidParameter(msg.into())
    }
}

/// Check that `xs` is strictly increasing; `what` names the series in the error.
pub(crate) fn ensure_strictly_increasing(xs: &[f64], what: &str) -> Result<(), OpticsError> {
    if let Some(i) = xs.iter().position(|x| !x.is_finite()) {
        return Err(OpticsError::data_format(format!(
            "{what}: non-finite wavelength at row {i}"
        )));
    }
    match xs.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => Err(OpticsError::data_format(format!(
            "{what}: wavelengths not strictly increasing at row {} ({} after {})",
            i + 1,
            xs[i + 1],
            xs[i]
        ))),
        None => Ok(()),
    }
}
