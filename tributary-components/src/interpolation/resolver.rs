use ndarray::{Array1, Array2, ArrayView1};
use tributary_core::{
    Component,
    constraint::{Constrained, StrictlyPositive},
};

use super::{InterpError, InterpolationConfig, UpstreamHistory, evaluate_batch, evaluate_point};

/// A request for input values at one time or at many times.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeQuery {
    /// A single time, typically from inside an integrator step.
    At(f64),
    /// A sequence of times, in any order.
    Over(Array1<f64>),
}

impl From<f64> for TimeQuery {
    fn from(time: f64) -> Self {
        Self::At(time)
    }
}

impl From<Vec<f64>> for TimeQuery {
    fn from(times: Vec<f64>) -> Self {
        Self::Over(Array1::from(times))
    }
}

impl From<Array1<f64>> for TimeQuery {
    fn from(times: Array1<f64>) -> Self {
        Self::Over(times)
    }
}

/// Values answering a [`TimeQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// One value per channel, answering [`TimeQuery::At`].
    Point(Array1<f64>),
    /// One row per query time, answering [`TimeQuery::Over`].
    Batch(Array2<f64>),
}

impl Resolved {
    /// Returns the point values, if this answers a single time.
    #[must_use]
    pub fn into_point(self) -> Option<Array1<f64>> {
        match self {
            Self::Point(values) => Some(values),
            Self::Batch(_) => None,
        }
    }

    /// Returns the value matrix, if this answers a sequence of times.
    #[must_use]
    pub fn into_batch(self) -> Option<Array2<f64>> {
        match self {
            Self::Point(_) => None,
            Self::Batch(values) => Some(values),
        }
    }
}

/// Chooses how to evaluate an [`UpstreamHistory`] for a given query.
///
/// - A single time is clamped to the history horizon (the stream is assumed
///   to sit at steady state after its last known sample) and answered with a
///   local Newton fit of `num_points` samples.
/// - A sequence of times is answered with one global spline, holding values
///   flat past the horizon without altering the query times.
///
/// # Example
///
/// ```
/// use tributary_components::interpolation::{
///     InterpolationConfig, TimeSeriesResolver, UpstreamHistory,
/// };
///
/// let history = UpstreamHistory::from_rows(
///     vec![0.0, 1.0, 2.0, 3.0, 4.0],
///     vec![vec![0.0], vec![1.0], vec![4.0], vec![9.0], vec![16.0]],
/// )
/// .unwrap();
/// let resolver = TimeSeriesResolver::new(&InterpolationConfig::default()).unwrap();
///
/// assert_eq!(resolver.resolve_at(&history, 10.0).unwrap()[0], 16.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeriesResolver {
    num_points: Constrained<usize, StrictlyPositive>,
}

impl TimeSeriesResolver {
    /// Creates a resolver from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &InterpolationConfig) -> Result<Self, InterpError> {
        config
            .validate()
            .map_err(|reason| InterpError::InvalidConfig { reason })?;

        let num_points =
            StrictlyPositive::new(config.num_points).map_err(|_| InterpError::InvalidConfig {
                reason: "num_points must be positive",
            })?;

        Ok(Self { num_points })
    }

    /// Returns the number of samples used by point fits.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.num_points.into_inner()
    }

    /// Answers a query using the point or batch path as appropriate.
    ///
    /// # Errors
    ///
    /// Propagates any [`InterpError`] from the chosen path.
    pub fn resolve(
        &self,
        history: &UpstreamHistory,
        query: TimeQuery,
    ) -> Result<Resolved, InterpError> {
        match query {
            TimeQuery::At(time) => self.resolve_at(history, time).map(Resolved::Point),
            TimeQuery::Over(times) => self
                .resolve_over(history, times.view())
                .map(Resolved::Batch),
        }
    }

    /// Evaluates the history at a single time, clamped to the horizon.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::NonFiniteTime`] for a NaN or infinite time, or
    /// any error from the local fit.
    pub fn resolve_at(
        &self,
        history: &UpstreamHistory,
        time: f64,
    ) -> Result<Array1<f64>, InterpError> {
        if !time.is_finite() {
            return Err(InterpError::NonFiniteTime { time });
        }

        let horizon = history.horizon();
        let clamped = time.min(horizon);
        if clamped < time {
            tracing::trace!(time, horizon, "clamping query to the history horizon");
        }

        evaluate_point(
            history.times(),
            history.values(),
            clamped,
            self.num_points(),
        )
    }

    /// Evaluates the history at every time in `times`.
    ///
    /// # Errors
    ///
    /// Returns any error from the batch path.
    pub fn resolve_over(
        &self,
        history: &UpstreamHistory,
        times: ArrayView1<f64>,
    ) -> Result<Array2<f64>, InterpError> {
        evaluate_batch(history.times(), history.values(), times)
    }
}

/// An upstream history bound to the resolver that evaluates it.
///
/// This is the form in which a stream holds its upstream data: every query
/// goes through [`Component::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamInterpolant {
    history: UpstreamHistory,
    resolver: TimeSeriesResolver,
}

impl UpstreamInterpolant {
    /// Binds a validated history to the resolver that will evaluate it.
    #[must_use]
    pub fn new(history: UpstreamHistory, resolver: TimeSeriesResolver) -> Self {
        tracing::debug!(
            samples = history.num_samples(),
            channels = history.num_channels(),
            horizon = history.horizon(),
            num_points = resolver.num_points(),
            "bound upstream history"
        );
        Self { history, resolver }
    }

    /// The bound upstream samples.
    #[must_use]
    pub fn history(&self) -> &UpstreamHistory {
        &self.history
    }

    /// The resolver used for every query.
    #[must_use]
    pub fn resolver(&self) -> &TimeSeriesResolver {
        &self.resolver
    }
}

impl Component for UpstreamInterpolant {
    type Input = TimeQuery;
    type Output = Resolved;
    type Error = InterpError;

    fn call(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.resolver.resolve(&self.history, input)
    }
}
