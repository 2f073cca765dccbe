use ndarray::{Array1, ArrayView1};
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use tributary_core::Component;

use super::InterpError;

/// Piecewise-linear interpolant over a single value channel.
///
/// Used by the batch path when a series is too short for a stable cubic
/// spline. Queries outside the sample range continue the end segments.
pub struct LinearChannel(Interp1DOwned<f64, Linear>);

impl LinearChannel {
    /// Creates a linear interpolant through `(times, values)`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::Validation`] if the grid is not strictly
    /// increasing or the lengths differ.
    pub fn new(times: ArrayView1<f64>, values: ArrayView1<f64>) -> Result<Self, InterpError> {
        Ok(Self(Interp1DOwned::new(
            times.to_owned(),
            values.to_owned(),
            Linear,
            Extrapolate::Enable,
        )?))
    }

    /// Evaluates the interpolant at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::Interpolation`] if the evaluation fails.
    pub fn evaluate(&self, time: f64) -> Result<f64, InterpError> {
        self.0.interpolate(&[time]).map_err(Into::into)
    }
}

impl Component for LinearChannel {
    type Input = f64;
    type Output = f64;
    type Error = InterpError;

    fn call(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.evaluate(input)
    }
}

/// Evaluates a set of per-channel linear interpolants at one time.
pub(crate) fn evaluate_channels(
    channels: &[LinearChannel],
    time: f64,
) -> Result<Array1<f64>, InterpError> {
    channels
        .iter()
        .map(|channel| channel.call(time))
        .collect::<Result<Vec<_>, _>>()
        .map(Array1::from)
}
