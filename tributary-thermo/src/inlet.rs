use std::error::Error as StdError;

use crate::{ControlLaw, ControllableSet, InputValues};

/// Error type returned by a [`DynamicInlet`].
pub type InletError = Box<dyn StdError + Send + Sync>;

/// What an inlet learns about the stream it is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InletBinding {
    stream: String,
    controllable: ControllableSet,
}

impl InletBinding {
    pub(crate) fn new(stream: &str, controllable: &ControllableSet) -> Self {
        Self {
            stream: stream.to_owned(),
            controllable: controllable.clone(),
        }
    }

    #[must_use]
    pub fn stream(&self) -> &str {
        &self.stream
    }

    #[must_use]
    pub fn controllable(&self) -> &ControllableSet {
        &self.controllable
    }
}

/// A generator of stream inputs as a function of time.
///
/// While attached, an inlet is the only source of a stream's inputs.
/// It may return any subset of the stream's controllable attributes.
pub trait DynamicInlet {
    /// Called once when the inlet is attached to a stream.
    fn bind(&mut self, _binding: InletBinding) {}

    /// Produces inputs at `time`.
    ///
    /// # Errors
    ///
    /// Returns an error if the inlet cannot produce values at `time`.
    fn evaluate_inputs(&self, time: f64) -> Result<InputValues, InletError>;
}

impl<F> DynamicInlet for F
where
    F: Fn(f64) -> InputValues,
{
    fn evaluate_inputs(&self, time: f64) -> Result<InputValues, InletError> {
        Ok(self(time))
    }
}

/// A [`DynamicInlet`] driven by a [`ControlLaw`].
///
/// Once bound, inputs are reported in the stream's controllable order.
#[derive(Debug)]
pub struct ControlledInlet {
    controls: ControlLaw,
    binding: Option<InletBinding>,
}

impl ControlledInlet {
    #[must_use]
    pub fn new(controls: ControlLaw) -> Self {
        Self {
            controls,
            binding: None,
        }
    }

    #[must_use]
    pub fn binding(&self) -> Option<&InletBinding> {
        self.binding.as_ref()
    }
}

impl DynamicInlet for ControlledInlet {
    fn bind(&mut self, binding: InletBinding) {
        tracing::debug!(stream = binding.stream(), "controlled inlet bound");
        self.binding = Some(binding);
    }

    fn evaluate_inputs(&self, time: f64) -> Result<InputValues, InletError> {
        let Some(binding) = &self.binding else {
            return Ok(self.controls.evaluate(time));
        };

        // Controllable attributes first, in order, then anything left over.
        let ordered = binding
            .controllable()
            .iter()
            .filter_map(|attribute| {
                self.controls
                    .evaluate_one(attribute, time)
                    .map(|value| (attribute, value))
            })
            .collect::<InputValues>();
        let leftover = self
            .controls
            .attributes()
            .filter(|&attribute| !binding.controllable().contains(attribute))
            .filter_map(|attribute| {
                self.controls
                    .evaluate_one(attribute, time)
                    .map(|value| (attribute, value))
            });

        Ok(ordered.iter().chain(leftover).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Attribute, PhaseKind};

    use super::*;

    #[test]
    fn closures_are_inlets() {
        let inlet = |t: f64| InputValues::new().with(Attribute::MassFlow, 2.0 * t);
        let inputs = inlet.evaluate_inputs(3.0).unwrap();
        assert_eq!(inputs.get(Attribute::MassFlow), Some(6.0));
    }

    #[test]
    fn bound_controlled_inlet_uses_stream_order() {
        let controls = ControlLaw::new()
            .with(Attribute::Temperature, |_| 300.0)
            .with(Attribute::MassFlow, |t| t);
        let mut inlet = ControlledInlet::new(controls);

        let controllable = ControllableSet::for_phase(PhaseKind::Liquid);
        inlet.bind(InletBinding::new("feed", &controllable));
        assert_eq!(inlet.binding().unwrap().stream(), "feed");

        let inputs = inlet.evaluate_inputs(1.5).unwrap();
        assert_eq!(
            inputs.iter().collect::<Vec<_>>(),
            vec![(Attribute::MassFlow, 1.5), (Attribute::Temperature, 300.0)]
        );
    }
}
