use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{InterpError, history};

/// A natural cubic spline through every sample of a multi-channel series.
///
/// Each channel gets its own piecewise cubic with continuous first and second
/// derivatives and zero second derivative at both ends.
/// Queries outside the sample range use the nearest end polynomial.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    times: Array1<f64>,
    values: Array2<f64>,
    second_derivatives: Array2<f64>,
}

impl CubicSpline {
    /// Builds the spline by solving the tridiagonal system for the knot
    /// second derivatives of every channel.
    ///
    /// # Errors
    ///
    /// - [`InterpError::InsufficientHistory`] if there are fewer than two samples.
    /// - [`InterpError::ShapeMismatch`] if `values` rows do not match `times`.
    /// - [`InterpError::DegenerateSpacing`] if sample times are not strictly
    ///   increasing.
    pub fn new(times: ArrayView1<f64>, values: ArrayView2<f64>) -> Result<Self, InterpError> {
        history::check_shape(times, values)?;
        let n = times.len();
        if n < 2 {
            return Err(InterpError::InsufficientHistory {
                required: 2,
                available: n,
            });
        }
        history::check_distinct(times)?;

        let mut second_derivatives = Array2::zeros(values.raw_dim());
        let mut u = vec![0.0; n];

        for c in 0..values.ncols() {
            u.fill(0.0);

            for i in 1..n - 1 {
                let sig = (times[i] - times[i - 1]) / (times[i + 1] - times[i - 1]);
                let p = sig * second_derivatives[[i - 1, c]] + 2.0;
                second_derivatives[[i, c]] = (sig - 1.0) / p;

                let slope_change = (values[[i + 1, c]] - values[[i, c]])
                    / (times[i + 1] - times[i])
                    - (values[[i, c]] - values[[i - 1, c]]) / (times[i] - times[i - 1]);
                u[i] = (6.0 * slope_change / (times[i + 1] - times[i - 1]) - sig * u[i - 1]) / p;
            }

            for k in (0..n - 2).rev() {
                second_derivatives[[k + 1, c]] =
                    second_derivatives[[k + 1, c]] * second_derivatives[[k + 2, c]] + u[k + 1];
            }
        }

        Ok(Self {
            times: times.to_owned(),
            values: values.to_owned(),
            second_derivatives,
        })
    }

    /// Returns the knot times.
    #[must_use]
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// Evaluates every channel at `time`.
    #[must_use]
    pub fn evaluate(&self, time: f64) -> Array1<f64> {
        let (lo, hi) = self.bracket(time);
        let h = self.times[hi] - self.times[lo];
        let a = (self.times[hi] - time) / h;
        let b = (time - self.times[lo]) / h;
        let curvature = h * h / 6.0;

        Array1::from_shape_fn(self.values.ncols(), |c| {
            a * self.values[[lo, c]]
                + b * self.values[[hi, c]]
                + ((a * a * a - a) * self.second_derivatives[[lo, c]]
                    + (b * b * b - b) * self.second_derivatives[[hi, c]])
                    * curvature
        })
    }

    /// Returns the knot interval used for `time`, clamped to the end intervals.
    fn bracket(&self, time: f64) -> (usize, usize) {
        let (mut lo, mut hi) = (0, self.times.len() - 1);
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.times[mid] > time {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        (lo, hi)
    }
}
