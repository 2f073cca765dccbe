use thiserror::Error;
use tributary_components::interpolation::InterpError;
use tributary_core::constraint::ConstraintError;

use crate::{Attribute, InletError, PhaseKind};

/// Errors that may occur when evaluating or updating a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Upstream history could not be validated or evaluated.
    #[error(transparent)]
    Interp(#[from] InterpError),

    /// The phase model rejected an update.
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// An input value violates a physical bound, such as a negative flow.
    #[error("invalid value for `{attribute}`")]
    Constraint {
        attribute: Attribute,
        #[source]
        source: ConstraintError,
    },

    /// Interpolated inputs were requested before any history was attached.
    #[error("stream `{stream}` has no upstream history")]
    NoUpstreamHistory { stream: String },

    /// The operation is only defined for some phases.
    #[error("{kind} streams do not support {operation}")]
    UnsupportedPhase {
        kind: PhaseKind,
        operation: &'static str,
    },

    /// A value was supplied for an attribute outside the controllable set.
    #[error("attribute `{attribute}` is not controllable")]
    NotControllable { attribute: Attribute },

    /// An attribute appears more than once in a controllable set.
    #[error("attribute `{attribute}` appears more than once")]
    DuplicateAttribute { attribute: Attribute },

    /// A vector does not have the length its context requires.
    #[error("{what}: expected {expected} values, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The attached dynamic inlet failed to produce inputs.
    #[error("dynamic inlet failed")]
    Inlet(#[source] InletError),
}

/// Errors reported by a [`PhaseModel`](crate::PhaseModel).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhaseError {
    /// The composition is empty, negative, or does not match the model.
    #[error("invalid composition: {0}")]
    InvalidComposition(String),

    /// More than one composition input was given in a single update.
    #[error("expected at most one composition input, found {count}")]
    ConflictingComposition { count: usize },

    /// The requested state is outside the model's physical domain.
    #[error("non-physical state: {0}")]
    NonPhysical(String),
}
