use std::ops::Range;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

use super::{InterpError, history};

/// An interpolating polynomial in Newton form, fitted independently for each
/// value channel.
///
/// Coefficients are the divided differences `f[t0]`, `f[t0, t1]`, ...,
/// `f[t0, ..., tk]`, one row per order.
/// The fit is exact: the polynomial passes through every sample it was
/// built from.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonPolynomial {
    nodes: Array1<f64>,
    coefficients: Array2<f64>,
}

impl NewtonPolynomial {
    /// Fits a polynomial of degree `times.len() - 1` through the samples.
    ///
    /// # Errors
    ///
    /// - [`InterpError::InsufficientHistory`] if there are no samples.
    /// - [`InterpError::ShapeMismatch`] if `values` has the wrong row count.
    /// - [`InterpError::DegenerateSpacing`] if sample times are not
    ///   increasing, or two of them sit within rounding distance.
    pub fn fit(times: ArrayView1<f64>, values: ArrayView2<f64>) -> Result<Self, InterpError> {
        let n = times.len();
        if n == 0 {
            return Err(InterpError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }
        if values.nrows() != n {
            return Err(InterpError::ShapeMismatch {
                what: "fit window rows",
                expected: n,
                found: values.nrows(),
            });
        }

        let mut coefficients = values.to_owned();
        for order in 1..n {
            for i in (order..n).rev() {
                let (left, right) = (times[i - order], times[i]);
                history::check_spacing(left, right)?;
                let span = right - left;

                let difference = (&coefficients.row(i) - &coefficients.row(i - 1)) / span;
                if difference.iter().any(|c| !c.is_finite()) {
                    return Err(InterpError::DegenerateSpacing { left, right });
                }
                coefficients.row_mut(i).assign(&difference);
            }
        }

        Ok(Self {
            nodes: times.to_owned(),
            coefficients,
        })
    }

    /// Returns the polynomial degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Evaluates every channel at `time` using nested multiplication.
    #[must_use]
    pub fn evaluate(&self, time: f64) -> Array1<f64> {
        let last = self.nodes.len() - 1;
        let mut value = self.coefficients.row(last).to_owned();
        for k in (0..last).rev() {
            let factor = time - self.nodes[k];
            value.mapv_inplace(|v| v * factor);
            value += &self.coefficients.row(k);
        }
        value
    }
}

/// Returns the range of sample indices used to fit around `query_time`.
///
/// The window opens one sample before the sample nearest to `query_time`
/// (ties resolve to the earlier sample) and spans up to `num_points`
/// samples. It is cut short at the end of the series, so queries near the
/// last sample may be fitted with fewer points.
///
/// `times` must be non-empty and non-decreasing.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use tributary_components::interpolation::sample_window;
///
/// let times = array![0.0, 1.0, 2.0, 3.0, 4.0];
/// assert_eq!(sample_window(times.view(), 2.5, 3), 1..4);
/// assert_eq!(sample_window(times.view(), 3.9, 3), 3..5);
/// assert_eq!(sample_window(times.view(), 1.0, 10), 0..5);
/// ```
#[must_use]
pub fn sample_window(times: ArrayView1<f64>, query_time: f64, num_points: usize) -> Range<usize> {
    let start = nearest_index(times, query_time).saturating_sub(1);
    let end = (start + num_points).min(times.len());
    start..end
}

/// Index of the sample time nearest to `query_time`, earliest on ties.
fn nearest_index(times: ArrayView1<f64>, query_time: f64) -> usize {
    let n = times.len();

    // First index whose time is not below the query.
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if times[mid] < query_time {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    let mut nearest = if lo == 0 {
        0
    } else if lo == n {
        n - 1
    } else if query_time - times[lo - 1] <= times[lo] - query_time {
        lo - 1
    } else {
        lo
    };

    while nearest > 0 && times[nearest - 1] == times[nearest] {
        nearest -= 1;
    }
    nearest
}

/// Evaluates a local Newton polynomial through the samples around `query_time`.
///
/// This is the point path used from inside an integrator loop: it fits only
/// [`sample_window`] samples, so the cost is independent of history length
/// apart from the nearest-sample search.
/// A query landing exactly on a sample time returns that sample's row.
///
/// `times` is assumed non-decreasing, as guaranteed by [`UpstreamHistory`].
/// No clamping is performed here; callers that need a steady-state policy
/// past the horizon clamp `query_time` first.
///
/// [`UpstreamHistory`]: super::UpstreamHistory
///
/// # Errors
///
/// - [`InterpError::InvalidConfig`] if `num_points` is zero.
/// - [`InterpError::NonFiniteTime`] if `query_time` is NaN or infinite.
/// - [`InterpError::InsufficientHistory`] or [`InterpError::ShapeMismatch`]
///   for empty or misaligned inputs.
/// - [`InterpError::DegenerateSpacing`] if the window holds repeated or
///   nearly repeated times.
/// - [`InterpError::NonFiniteResult`] if the evaluation overflows.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use tributary_components::interpolation::evaluate_point;
///
/// let times = array![0.0, 1.0, 2.0, 3.0, 4.0];
/// let values = array![[0.0], [1.0], [4.0], [9.0], [16.0]];
///
/// let y = evaluate_point(times.view(), values.view(), 2.5, 3).unwrap();
/// assert!((y[0] - 6.25).abs() < 1e-12);
/// ```
pub fn evaluate_point(
    times: ArrayView1<f64>,
    values: ArrayView2<f64>,
    query_time: f64,
    num_points: usize,
) -> Result<Array1<f64>, InterpError> {
    if num_points == 0 {
        return Err(InterpError::InvalidConfig {
            reason: "num_points must be positive",
        });
    }
    if !query_time.is_finite() {
        return Err(InterpError::NonFiniteTime { time: query_time });
    }
    history::check_shape(times, values)?;

    let window = sample_window(times, query_time, num_points);
    if window.len() < num_points {
        tracing::trace!(
            available = window.len(),
            requested = num_points,
            "fit window narrowed to available samples"
        );
    }

    if let Some(index) = window.clone().find(|&i| times[i] == query_time) {
        return Ok(values.row(index).to_owned());
    }

    let polynomial = NewtonPolynomial::fit(
        times.slice(s![window.clone()]),
        values.slice(s![window, ..]),
    )?;

    let value = polynomial.evaluate(query_time);
    if value.iter().any(|v| !v.is_finite()) {
        return Err(InterpError::NonFiniteResult { time: query_time });
    }
    Ok(value)
}
