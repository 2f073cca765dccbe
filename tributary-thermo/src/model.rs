//! Phase models that keep a stream's flow rates consistent.
//!
//! A stream never sets one flow rate on its own.
//! It hands a [`PhaseRequest`] to a [`PhaseModel`], which returns a complete
//! [`PhaseState`] the stream then adopts.

mod constant_density;

pub use constant_density::ConstantDensity;

use crate::PhaseError;

/// The flow rate that governs a phase update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowBasis {
    Mass,
    Mole,
    Volume,
}

/// Mass (kg/s), molar (mol/s) and volumetric (m³/s) flow rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flows {
    pub mass: f64,
    pub mole: f64,
    pub vol: f64,
}

/// A composition input, normalized by the model before use.
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    MassFractions(Vec<f64>),
    MoleFractions(Vec<f64>),
    /// Mass concentrations, in kg/m³.
    MassConcentrations(Vec<f64>),
    /// Molar concentrations, in mol/m³.
    MoleConcentrations(Vec<f64>),
}

impl Composition {
    /// Returns the number of components described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        match self {
            Self::MassFractions(v)
            | Self::MoleFractions(v)
            | Self::MassConcentrations(v)
            | Self::MoleConcentrations(v) => v,
        }
    }
}

/// Everything a model needs to recompute a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRequest {
    /// Which entry of `flows` is authoritative.
    pub basis: FlowBasis,
    pub flows: Flows,
    pub composition: Composition,
    /// Temperature, in K.
    pub temperature: f64,
    /// Pressure, in Pa.
    pub pressure: f64,
}

/// A consistent phase state returned by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub flows: Flows,
    pub mass_fractions: Vec<f64>,
}

/// Recomputes a consistent phase from a partial description.
///
/// Implementations must be pure: the same request always yields the same
/// state, and nothing outside the returned value changes.
pub trait PhaseModel {
    /// Returns the number of components the model describes.
    fn num_components(&self) -> usize;

    /// Computes a consistent state from `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] if the request is invalid or outside the
    /// model's domain.
    fn recompute(&self, request: &PhaseRequest) -> Result<PhaseState, PhaseError>;
}
