use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

/// Errors that can occur while validating or interpolating a time series.
///
/// Queries past the last sample time are never an error: both the point and
/// batch paths hold the horizon value instead.
#[derive(Error, Debug)]
pub enum InterpError {
    #[error("time series has {available} samples but at least {required} are required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("sample times must be non-decreasing: t[{index}] = {next} follows {previous}")]
    UnsortedHistory {
        index: usize,
        previous: f64,
        next: f64,
    },

    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("sample times {left} and {right} are too close to fit a polynomial through")]
    DegenerateSpacing { left: f64, right: f64 },

    #[error("time {time} is not finite")]
    NonFiniteTime { time: f64 },

    #[error("sample value at row {row}, column {column} is not finite")]
    NonFiniteSample { row: usize, column: usize },

    #[error("interpolated value at time {time} is not finite")]
    NonFiniteResult { time: f64 },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}
