//! Interpolation of upstream time series for stream inputs.
//!
//! An upstream unit operation leaves behind a sparse, irregularly timed
//! record of vector-valued outputs, captured here as an [`UpstreamHistory`].
//! Downstream, an integrator asks for those values at arbitrary times.
//! Two evaluation paths are provided:
//!
//! - **Point queries** ([`evaluate_point`]) fit a local Newton polynomial
//!   through a small window of samples around the query time.
//!   This is cheap enough to run inside an integrator's right-hand side.
//! - **Batch queries** ([`evaluate_batch`]) build one global natural
//!   [`CubicSpline`] and evaluate it over many times at once, holding the
//!   last sample flat for queries past the horizon.
//!
//! [`TimeSeriesResolver`] picks between them based on the shape of the
//! query, and [`UpstreamInterpolant`] binds a resolver to a history as a
//! [`Component`](tributary_core::Component).

mod config;
mod error;
mod extrapolate;
mod history;
mod linear;
mod newton;
mod resolver;
mod spline;

pub use config::InterpolationConfig;
pub use error::InterpError;
pub use extrapolate::{MIN_SPLINE_SAMPLES, evaluate_batch};
pub use history::UpstreamHistory;
pub use linear::LinearChannel;
pub use newton::{NewtonPolynomial, evaluate_point, sample_window};
pub use resolver::{Resolved, TimeQuery, TimeSeriesResolver, UpstreamInterpolant};
pub use spline::CubicSpline;
