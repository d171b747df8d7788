//! One-dimensional interpolation helpers.
//!
//! [`CubicSpline`] fits a natural cubic spline through strictly increasing
//! sample points. It backs the motored-pressure reference curve, where a
//! smooth interpolant over crank angle is needed between solver samples.

use thiserror::Error;

/// Errors raised while fitting or evaluating an interpolant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    /// Fewer samples than the interpolant requires.
    #[error("at least {required} samples are required, got {len}")]
    TooFewPoints { len: usize, required: usize },

    /// The abscissa and ordinate slices differ in length.
    #[error("sample length mismatch: {xs} abscissae vs {ys} ordinates")]
    LengthMismatch { xs: usize, ys: usize },

    /// Abscissae must be strictly increasing.
    #[error("abscissae are not strictly increasing at index {index}")]
    NotIncreasing { index: usize },

    /// A sample value is NaN or infinite.
    #[error("sample {index} is not finite")]
    NotFinite { index: usize },

    /// The query lies outside the fitted range.
    #[error("x = {x} is outside [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },
}

/// A natural cubic spline (zero curvature at both ends).
///
/// # Example
///
/// ```
/// use twine_engine_models::support::interpolate::CubicSpline;
///
/// let xs = [0.0, 1.0, 2.0, 3.0];
/// let ys = [0.0, 1.0, 8.0, 27.0];
/// let spline = CubicSpline::natural(&xs, &ys).unwrap();
///
/// assert_eq!(spline.eval(2.0).unwrap(), 8.0);
/// assert!(spline.eval(3.5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fits a natural cubic spline through `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// Returns an [`InterpolationError`] if fewer than two samples are given,
    /// the slices differ in length, any value is not finite, or `xs` is not
    /// strictly increasing.
    pub fn natural(xs: &[f64], ys: &[f64]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        let n = xs.len();
        if n < 2 {
            return Err(InterpolationError::TooFewPoints {
                len: n,
                required: 2,
            });
        }
        for (index, (x, y)) in xs.iter().zip(ys).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(InterpolationError::NotFinite { index });
            }
        }
        if let Some(index) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InterpolationError::NotIncreasing { index: index + 1 });
        }

        let curvature = natural_curvature(xs, ys);

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            curvature,
        })
    }

    /// Evaluates the spline at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::OutOfRange`] if `x` lies outside the
    /// fitted abscissae (or is NaN).
    pub fn eval(&self, x: f64) -> Result<f64, InterpolationError> {
        let (min, max) = self.domain();
        if !(min..=max).contains(&x) {
            return Err(InterpolationError::OutOfRange { x, min, max });
        }

        // Index of the interval [xs[i], xs[i + 1]] containing x.
        let upper = self.xs.partition_point(|&xi| xi <= x);
        let i = upper.saturating_sub(1).min(self.xs.len() - 2);

        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;

        Ok(a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.curvature[i] + (b * b * b - b) * self.curvature[i + 1])
                * h
                * h
                / 6.0)
    }

    /// Returns the fitted abscissa range `(min, max)`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

/// Returns `n` evenly spaced values from `start` to `end`, inclusive.
///
/// A single sample yields `[start]`; zero samples yield an empty vector.
#[must_use]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Solves the tridiagonal system for second derivatives with natural ends.
fn natural_curvature(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut curvature = vec![0.0; n];
    if n < 3 {
        return curvature;
    }

    let mut diag = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    let mut upper = vec![0.0; n];

    for i in 1..n - 1 {
        let h0 = xs[i] - xs[i - 1];
        let h1 = xs[i + 1] - xs[i];
        let lower = h0;
        diag[i] = 2.0 * (h0 + h1);
        upper[i] = h1;
        rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);

        // Forward elimination.
        if i > 1 {
            let factor = lower / diag[i - 1];
            diag[i] -= factor * upper[i - 1];
            rhs[i] -= factor * rhs[i - 1];
        }
    }

    for i in (1..n - 1).rev() {
        curvature[i] = (rhs[i] - upper[i] * curvature[i + 1]) / diag[i];
    }

    curvature
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn reproduces_samples() {
        let xs = linspace(0.0, 4.0, 9);
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();

        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(spline.eval(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn exact_for_straight_lines() {
        let xs = [0.0, 0.5, 2.0, 3.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();

        assert_relative_eq!(spline.eval(1.3).unwrap(), 2.9, epsilon = 1e-12);
        assert_relative_eq!(spline.eval(5.5).unwrap(), 15.5, epsilon = 1e-12);
    }

    #[test]
    fn smooth_curve_is_close_between_samples() {
        let xs = linspace(0.0, std::f64::consts::PI, 60);
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();

        assert_relative_eq!(spline.eval(1.0).unwrap(), 1.0_f64.sin(), epsilon = 1e-5);
    }

    #[test]
    fn rejects_bad_samples() {
        assert_eq!(
            CubicSpline::natural(&[0.0], &[1.0]),
            Err(InterpolationError::TooFewPoints {
                len: 1,
                required: 2
            })
        );
        assert_eq!(
            CubicSpline::natural(&[0.0, 1.0], &[1.0]),
            Err(InterpolationError::LengthMismatch { xs: 2, ys: 1 })
        );
        assert_eq!(
            CubicSpline::natural(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(InterpolationError::NotIncreasing { index: 2 })
        );
        assert_eq!(
            CubicSpline::natural(&[0.0, f64::NAN], &[1.0, 2.0]),
            Err(InterpolationError::NotFinite { index: 1 })
        );
    }

    #[test]
    fn out_of_range_queries_fail() {
        let spline = CubicSpline::natural(&[0.0, 1.0], &[0.0, 1.0]).unwrap();

        assert!(spline.eval(-0.1).is_err());
        assert!(spline.eval(f64::NAN).is_err());
        assert_relative_eq!(spline.eval(1.0).unwrap(), 1.0);
    }

    #[test]
    fn linspace_hits_both_ends() {
        let values = linspace(1.0, 2.0, 5);

        assert_eq!(values.len(), 5);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[4], 2.0);
        assert_relative_eq!(values[2], 1.5);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 1.0, 1), vec![3.0]);
    }
}
