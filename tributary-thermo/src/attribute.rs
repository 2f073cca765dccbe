use std::fmt;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{PhaseKind, StreamError};

/// A stream attribute that can be driven by a time-dependent input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Mass flow rate, in kg/s.
    MassFlow,
    /// Molar flow rate, in mol/s.
    MoleFlow,
    /// Volumetric flow rate, in m³/s.
    VolFlow,
    /// Temperature, in K.
    #[serde(rename = "temp")]
    Temperature,
    /// Pressure, in Pa.
    #[serde(rename = "pres")]
    Pressure,
}

impl Attribute {
    /// Returns the attribute name as used in labelled inputs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MassFlow => "mass_flow",
            Self::MoleFlow => "mole_flow",
            Self::VolFlow => "vol_flow",
            Self::Temperature => "temp",
            Self::Pressure => "pres",
        }
    }

    /// Returns `true` for the three flow rates.
    #[must_use]
    pub const fn is_flow(self) -> bool {
        matches!(self, Self::MassFlow | Self::MoleFlow | Self::VolFlow)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The ordered attributes of a stream that accept time-dependent inputs.
///
/// The order is significant: it is the column order expected of upstream
/// history and the order in which static inputs are reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllableSet(Vec<Attribute>);

impl ControllableSet {
    /// Creates a set from attributes in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::DuplicateAttribute`] if an attribute repeats.
    pub fn new<I>(attributes: I) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = Attribute>,
    {
        let mut ordered = Vec::new();
        for attribute in attributes {
            if ordered.contains(&attribute) {
                return Err(StreamError::DuplicateAttribute { attribute });
            }
            ordered.push(attribute);
        }
        Ok(Self(ordered))
    }

    /// Returns the default set for a phase.
    ///
    /// Liquids and vapors control every flow basis plus temperature.
    /// Solids have no volumetric flow input.
    #[must_use]
    pub fn for_phase(kind: PhaseKind) -> Self {
        use Attribute::{MassFlow, MoleFlow, Temperature, VolFlow};

        match kind {
            PhaseKind::Liquid | PhaseKind::Vapor => {
                Self(vec![MassFlow, MoleFlow, VolFlow, Temperature])
            }
            PhaseKind::Solid => Self(vec![MassFlow, MoleFlow, Temperature]),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.0.contains(&attribute)
    }

    /// Returns the column index of `attribute`, if it is controllable.
    #[must_use]
    pub fn position(&self, attribute: Attribute) -> Option<usize> {
        self.0.iter().position(|&a| a == attribute)
    }

    /// Labels one value per attribute, in set order.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ShapeMismatch`] unless `values` has exactly one
    /// entry per attribute.
    pub fn label(&self, values: ArrayView1<f64>) -> Result<InputValues, StreamError> {
        if values.len() != self.len() {
            return Err(StreamError::ShapeMismatch {
                what: "controllable values",
                expected: self.len(),
                found: values.len(),
            });
        }
        Ok(self.iter().zip(values.iter().copied()).collect())
    }
}

/// Input values keyed by attribute, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputValues(Vec<(Attribute, f64)>);

impl InputValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a value, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: f64) -> Self {
        self.insert(attribute, value);
        self
    }

    /// Sets `attribute` to `value`, returning any previous value.
    ///
    /// A replaced value keeps its original position.
    pub fn insert(&mut self, attribute: Attribute, value: f64) -> Option<f64> {
        match self.0.iter_mut().find(|(a, _)| *a == attribute) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((attribute, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        self.0
            .iter()
            .find_map(|&(a, value)| (a == attribute).then_some(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.0.iter().map(|&(attribute, _)| attribute)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the values alone, in order.
    #[must_use]
    pub fn to_array(&self) -> Array1<f64> {
        self.0.iter().map(|&(_, value)| value).collect()
    }
}

impl FromIterator<(Attribute, f64)> for InputValues {
    fn from_iter<I: IntoIterator<Item = (Attribute, f64)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (attribute, value) in iter {
            values.insert(attribute, value);
        }
        values
    }
}
