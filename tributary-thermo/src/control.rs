use std::{collections::BTreeMap, fmt};

use crate::{Attribute, InputValues};

type ControlFn = Box<dyn Fn(f64) -> f64>;

/// Prescribed inputs as functions of time, one per attribute.
///
/// Any extra parameters a law needs are captured by its closure.
///
/// # Example
///
/// ```
/// use tributary_thermo::{Attribute, ControlLaw};
///
/// let ramp = 0.5;
/// let controls = ControlLaw::new()
///     .with(Attribute::MassFlow, move |t| 1.0 + ramp * t)
///     .with(Attribute::Temperature, |_| 320.0);
///
/// let inputs = controls.evaluate(2.0);
/// assert_eq!(inputs.get(Attribute::MassFlow), Some(2.0));
/// assert_eq!(inputs.get(Attribute::Temperature), Some(320.0));
/// ```
#[derive(Default)]
pub struct ControlLaw {
    laws: BTreeMap<Attribute, ControlFn>,
}

impl ControlLaw {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a law for `attribute`, replacing any existing one.
    #[must_use]
    pub fn with<F>(mut self, attribute: Attribute, law: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        self.insert(attribute, law);
        self
    }

    pub fn insert<F>(&mut self, attribute: Attribute, law: F)
    where
        F: Fn(f64) -> f64 + 'static,
    {
        self.laws.insert(attribute, Box::new(law));
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.laws.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.laws.contains_key(&attribute)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }

    /// Evaluates a single law at `time`.
    #[must_use]
    pub fn evaluate_one(&self, attribute: Attribute, time: f64) -> Option<f64> {
        self.laws.get(&attribute).map(|law| law(time))
    }

    /// Evaluates every law at `time`.
    #[must_use]
    pub fn evaluate(&self, time: f64) -> InputValues {
        self.laws
            .iter()
            .map(|(&attribute, law)| (attribute, law(time)))
            .collect()
    }
}

impl fmt::Debug for ControlLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.laws.keys()).finish()
    }
}
