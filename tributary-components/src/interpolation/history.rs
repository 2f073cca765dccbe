use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::InterpError;

/// A validated record of upstream outputs sampled over time.
///
/// Rows of `values` are aligned with `times`; each column is one value
/// channel (a controllable attribute or a composition channel).
///
/// A history always holds at least one sample, its times are finite and
/// non-decreasing, and its values are finite.
/// Repeated sample times are accepted here but rejected by any fit whose
/// window contains them.
///
/// # Example
///
/// ```
/// use tributary_components::interpolation::UpstreamHistory;
///
/// let history = UpstreamHistory::from_rows(
///     vec![0.0, 1.0, 2.0],
///     vec![vec![1.0, 300.0], vec![1.5, 305.0], vec![2.0, 310.0]],
/// )
/// .unwrap();
///
/// assert_eq!(history.num_samples(), 3);
/// assert_eq!(history.num_channels(), 2);
/// assert_eq!(history.horizon(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamHistory {
    times: Array1<f64>,
    values: Array2<f64>,
}

impl UpstreamHistory {
    /// Creates a history from a time grid and a matrix of sample rows.
    ///
    /// # Errors
    ///
    /// - [`InterpError::InsufficientHistory`] if `times` is empty.
    /// - [`InterpError::ShapeMismatch`] if the row count differs from the
    ///   number of times, or if there are no value channels.
    /// - [`InterpError::NonFiniteTime`] or [`InterpError::NonFiniteSample`]
    ///   for NaN or infinite entries.
    /// - [`InterpError::UnsortedHistory`] if the times decrease anywhere.
    pub fn new<T: Into<Array1<f64>>>(times: T, values: Array2<f64>) -> Result<Self, InterpError> {
        let times = times.into();
        validate(times.view(), values.view())?;
        Ok(Self { times, values })
    }

    /// Creates a history from a time grid and one `Vec` per sample row.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::ShapeMismatch`] if the rows have different
    /// lengths, plus any error reported by [`UpstreamHistory::new`].
    pub fn from_rows(times: Vec<f64>, rows: Vec<Vec<f64>>) -> Result<Self, InterpError> {
        let channels = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != channels) {
            return Err(InterpError::ShapeMismatch {
                what: "history row length",
                expected: channels,
                found: row.len(),
            });
        }

        let num_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((num_rows, channels), flat).map_err(|_| {
            InterpError::ShapeMismatch {
                what: "history matrix",
                expected: num_rows * channels,
                found: num_rows,
            }
        })?;

        Self::new(times, values)
    }

    /// Returns the sample times.
    #[must_use]
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// Returns the sample matrix, one row per sample time.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.times.len()
    }

    /// Returns the number of value channels per sample.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.values.ncols()
    }

    /// Returns the last sample time, beyond which queries are held flat.
    #[must_use]
    pub fn horizon(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Returns the sample row at the horizon.
    #[must_use]
    pub fn horizon_values(&self) -> ArrayView1<'_, f64> {
        self.values.row(self.values.nrows() - 1)
    }
}

/// Checks the full set of history invariants.
pub(crate) fn validate(times: ArrayView1<f64>, values: ArrayView2<f64>) -> Result<(), InterpError> {
    check_shape(times, values)?;

    if let Some(&time) = times.iter().find(|t| !t.is_finite()) {
        return Err(InterpError::NonFiniteTime { time });
    }

    for index in 1..times.len() {
        let (previous, next) = (times[index - 1], times[index]);
        if next < previous {
            return Err(InterpError::UnsortedHistory {
                index,
                previous,
                next,
            });
        }
    }

    if let Some(((row, column), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InterpError::NonFiniteSample { row, column });
    }

    Ok(())
}

/// Checks that there is at least one sample and that rows line up with times.
///
/// This is the only validation repeated on every query; ordering and
/// finiteness are established once when an [`UpstreamHistory`] is built.
pub(crate) fn check_shape(times: ArrayView1<f64>, values: ArrayView2<f64>) -> Result<(), InterpError> {
    if times.is_empty() {
        return Err(InterpError::InsufficientHistory {
            required: 1,
            available: 0,
        });
    }

    if values.nrows() != times.len() {
        return Err(InterpError::ShapeMismatch {
            what: "history rows",
            expected: times.len(),
            found: values.nrows(),
        });
    }

    if values.ncols() == 0 {
        return Err(InterpError::ShapeMismatch {
            what: "history channels",
            expected: 1,
            found: 0,
        });
    }

    Ok(())
}

/// Relative tolerance below which two sample times count as the same time.
const SPACING_TOLERANCE: f64 = 1e3 * f64::EPSILON;

/// Rejects repeated or nearly repeated sample times, which no exact fit can
/// pass through.
pub(crate) fn check_distinct(times: ArrayView1<f64>) -> Result<(), InterpError> {
    for index in 1..times.len() {
        check_spacing(times[index - 1], times[index])?;
    }
    Ok(())
}

/// Rejects a span no wider than rounding noise at the scale of its ends.
pub(crate) fn check_spacing(left: f64, right: f64) -> Result<(), InterpError> {
    let scale = left.abs().max(right.abs()).max(1.0);
    if right - left <= SPACING_TOLERANCE * scale {
        return Err(InterpError::DegenerateSpacing { left, right });
    }
    Ok(())
}
