use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

use super::{
    CubicSpline, InterpError, history,
    linear::{LinearChannel, evaluate_channels},
};

/// Fewest samples for which the batch path fits a cubic spline.
///
/// Shorter series fall back to piecewise-linear interpolation (two or three
/// samples) or a constant (one sample).
pub const MIN_SPLINE_SAMPLES: usize = 4;

/// Global interpolant used for the in-range part of a batch query.
enum BatchInterpolant {
    Constant(Array1<f64>),
    Linear(Vec<LinearChannel>),
    Cubic(CubicSpline),
}

impl BatchInterpolant {
    fn build(times: ArrayView1<f64>, values: ArrayView2<f64>) -> Result<Self, InterpError> {
        let n = times.len();
        if n == 1 {
            return Ok(Self::Constant(values.row(0).to_owned()));
        }

        if n < MIN_SPLINE_SAMPLES {
            tracing::debug!(
                samples = n,
                "too few samples for a cubic spline, using linear interpolation"
            );
            history::check_distinct(times)?;
            let channels = values
                .columns()
                .into_iter()
                .map(|column| LinearChannel::new(times, column))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::Linear(channels));
        }

        Ok(Self::Cubic(CubicSpline::new(times, values)?))
    }

    fn evaluate(&self, time: f64) -> Result<Array1<f64>, InterpError> {
        match self {
            Self::Constant(row) => Ok(row.clone()),
            Self::Linear(channels) => evaluate_channels(channels, time),
            Self::Cubic(spline) => Ok(spline.evaluate(time)),
        }
    }
}

/// Evaluates a series at many times at once, holding it flat past the horizon.
///
/// Builds one global interpolant over all samples (a natural [`CubicSpline`]
/// once there are at least [`MIN_SPLINE_SAMPLES`]), evaluates it for every
/// query at or before the last sample time, and fills every later query with
/// the last sample row.
/// Holding the horizon value keeps spline overshoot out of a calling
/// integrator no matter how far past the data it asks.
///
/// Row `i` of the result answers `query_times[i]`; the order of the queries is
/// preserved even though in-range and held rows are filled separately.
///
/// # Errors
///
/// - [`InterpError::NonFiniteTime`] if any query time is NaN or infinite.
/// - [`InterpError::InsufficientHistory`] or [`InterpError::ShapeMismatch`]
///   for empty or misaligned inputs.
/// - [`InterpError::DegenerateSpacing`] if sample times repeat.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use tributary_components::interpolation::evaluate_batch;
///
/// let times = array![0.0, 1.0, 2.0, 3.0, 4.0];
/// let values = array![[0.0], [1.0], [4.0], [9.0], [16.0]];
/// let queries = array![6.0, 0.0, 2.0, 4.0];
///
/// let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();
/// assert_eq!(y.column(0).to_vec(), vec![16.0, 0.0, 4.0, 16.0]);
/// ```
pub fn evaluate_batch(
    times: ArrayView1<f64>,
    values: ArrayView2<f64>,
    query_times: ArrayView1<f64>,
) -> Result<Array2<f64>, InterpError> {
    history::check_shape(times, values)?;
    if let Some(&time) = query_times.iter().find(|t| !t.is_finite()) {
        return Err(InterpError::NonFiniteTime { time });
    }

    let horizon = times[times.len() - 1];
    let (in_range, beyond): (Vec<usize>, Vec<usize>) =
        (0..query_times.len()).partition(|&i| query_times[i] <= horizon);

    let mut output = Array2::zeros((query_times.len(), values.ncols()));

    if !in_range.is_empty() {
        let interpolant = BatchInterpolant::build(times, values)?;
        for i in in_range {
            output.row_mut(i).assign(&interpolant.evaluate(query_times[i])?);
        }
    }

    if !beyond.is_empty() {
        tracing::trace!(
            count = beyond.len(),
            horizon,
            "holding queries past the horizon at the last sample"
        );
        let held = values.slice(s![-1, ..]);
        for i in beyond {
            output.row_mut(i).assign(&held);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    use super::*;

    fn squares() -> (Array1<f64>, Array2<f64>) {
        (
            array![0.0, 1.0, 2.0, 3.0, 4.0],
            array![[0.0], [1.0], [4.0], [9.0], [16.0]],
        )
    }

    #[test]
    fn spline_hits_samples_and_holds_past_horizon() {
        let (times, values) = squares();
        let queries = array![0.0, 2.0, 4.0, 6.0];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();

        assert_eq!(y.dim(), (4, 1));
        assert_relative_eq!(y[[0, 0]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(y[[1, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(y[[2, 0]], 16.0, epsilon = 1e-12);
        assert_eq!(y[[3, 0]], 16.0);
    }

    #[test]
    fn hold_is_identical_regardless_of_distance() {
        let (times, values) = squares();
        let queries = array![4.0 + 1e-9, 5.0, 1e3, 1e12];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();
        for row in y.rows() {
            assert_eq!(row[0], 16.0);
        }
    }

    #[test]
    fn preserves_order_of_mixed_queries() {
        let times = array![0.0, 1.0, 2.0, 3.0];
        let values = array![[0.0, 10.0], [1.0, 20.0], [2.0, 30.0], [3.0, 40.0]];
        let queries = array![9.0, 1.0, 7.0, 0.0, 3.0, 2.0];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();

        let expected = [
            [3.0, 40.0],
            [1.0, 20.0],
            [3.0, 40.0],
            [0.0, 10.0],
            [3.0, 40.0],
            [2.0, 30.0],
        ];
        for (row, expected) in y.rows().into_iter().zip(expected) {
            assert_relative_eq!(row[0], expected[0], epsilon = 1e-12);
            assert_relative_eq!(row[1], expected[1], epsilon = 1e-12);
        }
    }

    #[test]
    fn short_series_fall_back_to_linear() {
        let times = array![0.0, 1.0, 3.0];
        let values = array![[0.0], [2.0], [6.0]];
        let queries = array![0.5, 2.0, 3.0, 10.0];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();

        assert_relative_eq!(y[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(y[[1, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(y[[2, 0]], 6.0, epsilon = 1e-12);
        assert_eq!(y[[3, 0]], 6.0);
    }

    #[test]
    fn single_sample_is_constant() {
        let times = array![1.0];
        let values = array![[5.0, 6.0]];
        let queries = array![0.0, 1.0, 2.0];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();
        for row in y.rows() {
            assert_eq!(row, array![5.0, 6.0]);
        }
    }

    #[test]
    fn all_queries_beyond_horizon_skip_the_fit() {
        // Repeated times would fail a fit, but nothing needs one here.
        let times = array![0.0, 1.0, 1.0, 2.0, 3.0];
        let values = array![[0.0], [1.0], [1.0], [2.0], [3.0]];
        let queries = array![4.0, 5.0];
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();
        assert_eq!(y.column(0).to_vec(), vec![3.0, 3.0]);
    }

    #[test]
    fn nearly_repeated_times_fail_the_fit() {
        let queries = array![1.4];

        let times = array![0.0, 1.0, 1.0 + 1e-13, 2.0, 3.0];
        let values = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        assert!(matches!(
            evaluate_batch(times.view(), values.view(), queries.view()),
            Err(InterpError::DegenerateSpacing { left, .. }) if left == 1.0
        ));

        let times = array![0.0, 1.0, 1.0 + 1e-13];
        let values = array![[0.0], [1.0], [2.0]];
        assert!(matches!(
            evaluate_batch(times.view(), values.view(), queries.view()),
            Err(InterpError::DegenerateSpacing { .. })
        ));
    }

    #[test]
    fn empty_query_yields_empty_matrix() {
        let (times, values) = squares();
        let queries = Array1::<f64>::zeros(0);
        let y = evaluate_batch(times.view(), values.view(), queries.view()).unwrap();
        assert_eq!(y.dim(), (0, 1));
    }

    #[test]
    fn rejects_nan_queries() {
        let (times, values) = squares();
        let queries = array![1.0, f64::NAN];
        assert!(matches!(
            evaluate_batch(times.view(), values.view(), queries.view()),
            Err(InterpError::NonFiniteTime { .. })
        ));
    }
}
