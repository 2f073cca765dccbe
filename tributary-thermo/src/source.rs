use std::fmt;

use crate::DynamicInlet;

/// Where a stream's inputs come from.
///
/// Switched by [`Stream::attach_inlet`](crate::Stream::attach_inlet) and
/// [`Stream::detach_inlet`](crate::Stream::detach_inlet).
#[derive(Default)]
pub enum InputSource {
    /// The stream's own current state.
    #[default]
    Static,
    /// An attached generator, which shadows everything else.
    Inlet(Box<dyn DynamicInlet>),
}

impl InputSource {
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Inlet(_))
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::Inlet(_) => f.write_str("Inlet(..)"),
        }
    }
}
