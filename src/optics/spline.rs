//! Natural cubic spline used to resample transmission and optical-density
//! curves.
//!
//! Vendor data arrives at its own wavelength spacing, and a light source is
//! sampled on yet another. The spline gives a smooth curve through every
//! knot so both can be evaluated on a common wavelength set.

use super::error::{OpticsError, ensure_strictly_increasing};

/// A natural cubic spline (zero second derivative at both ends).
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Knot wavelengths, strictly increasing.
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `(xs[i], ys[i])`.
    ///
    /// Needs at least two knots and strictly increasing `xs`. Two knots give
    /// a straight line.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, OpticsError> {
        if xs.len() != ys.len() {
            return Err(OpticsError::data_format(format!(
                "spline: {} knots but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(OpticsError::data_format(
                "spline: need at least 2 knots",
            ));
        }
        ensure_strictly_increasing(&xs, "spline")?;

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Forward sweep of the tridiagonal system.
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            u[i] = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * u[i] / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// Evaluate at `x`. Outside the knot range the boundary cubic is
    /// continued, so extrapolation is always enabled.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();

        // Index of the interval [lo, lo + 1]; clamped to the end intervals.
        let lo = self
            .xs
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(n - 2);
        let hi = lo + 1;

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }

    /// Evaluate at every point of `xs`, preserving order.
    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spline_passes_through_knots() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();

        for (x, y) in xs.iter().zip(ys.iter()) {
            let result = spline.evaluate(*x);
            assert!(
                (result - y).abs() < 1e-10,
                "Spline({x}) = {result} but expected {y}"
            );
        }
    }

    #[test]
    fn test_two_knots_is_linear() {
        let spline = CubicSpline::new(vec![0.0, 10.0], vec![0.0, 1.0]).unwrap();
        assert!((spline.evaluate(5.0) - 0.5).abs() < 1e-12);
        // Extrapolation continues the line.
        assert!((spline.evaluate(20.0) - 2.0).abs() < 1e-12);
        assert!((spline.evaluate(-10.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_data_stays_constant() {
        let xs: Vec<f64> = (0..50).map(|i| 400.0 + i as f64).collect();
        let ys = vec![0.98; xs.len()];
        let spline = CubicSpline::new(xs, ys).unwrap();
        for x in [380.0, 400.5, 425.25, 449.0, 470.0] {
            assert!((spline.evaluate(x) - 0.98).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert!(CubicSpline::new(vec![1.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![1.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::new(vec![3.0, 2.0, 1.0], vec![1.0, 2.0, 3.0]).is_err());
    }
}
