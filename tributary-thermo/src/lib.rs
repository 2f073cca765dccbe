//! Process streams with time-dependent inputs for the Tributary framework.
//!
//! A [`Stream`] is a flowing material of one [`PhaseKind`] whose controllable
//! attributes can be queried at arbitrary simulation times.
//! Its inputs come from one of three places:
//!
//! - its own current state, when nothing else is attached;
//! - an attached [`DynamicInlet`], which replaces the state entirely;
//! - interpolated upstream history, for liquid streams fed by an upstream
//!   unit operation (see [`Stream::interpolate_inputs`]).
//!
//! Flow rates are owned by the stream and only change through a
//! [`PhaseModel`], which keeps mass, mole and volume flows consistent.

mod attribute;
mod control;
mod error;
mod inlet;
mod phase;
mod source;
mod stream;

pub mod model;

pub use attribute::{Attribute, ControllableSet, InputValues};
pub use control::ControlLaw;
pub use error::{PhaseError, StreamError};
pub use inlet::{ControlledInlet, DynamicInlet, InletBinding, InletError};
pub use model::PhaseModel;
pub use phase::PhaseKind;
pub use source::InputSource;
pub use stream::{PhaseUpdate, Stream, StreamBuilder};
