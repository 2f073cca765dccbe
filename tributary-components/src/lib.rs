//! Components for evaluating Tributary stream inputs over time.
//!
//! The [`interpolation`] module bridges discrete upstream time series to
//! continuous-time queries issued from an integrator.

pub mod interpolation;
