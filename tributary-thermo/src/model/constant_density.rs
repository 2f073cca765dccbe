use uom::si::{
    f64::{MassDensity, MolarMass},
    mass_density::kilogram_per_cubic_meter,
    molar_mass::kilogram_per_mole,
};

use crate::PhaseError;

use super::{Composition, FlowBasis, Flows, PhaseModel, PhaseRequest, PhaseState};

/// A mixture of fixed-density components.
///
/// Density does not depend on temperature, pressure or composition, so
/// volumetric flow is simply `ṁ / ρ`.
/// Molar flow uses the mixture molar mass `M = 1 / Σ (wᵢ / Mᵢ)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDensity {
    molar_masses: Vec<f64>,
    density: f64,
}

impl ConstantDensity {
    /// Creates a model from per-component molar masses and a mixture density.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NonPhysical`] if there are no components, or any
    /// molar mass or the density is not finite and strictly positive.
    pub fn new(molar_masses: &[MolarMass], density: MassDensity) -> Result<Self, PhaseError> {
        if molar_masses.is_empty() {
            return Err(PhaseError::NonPhysical(
                "at least one component is required".into(),
            ));
        }

        let molar_masses: Vec<f64> = molar_masses
            .iter()
            .map(|m| m.get::<kilogram_per_mole>())
            .collect();
        if let Some(m) = molar_masses.iter().find(|m| !is_positive(**m)) {
            return Err(PhaseError::NonPhysical(format!(
                "molar mass must be positive, got {m} kg/mol"
            )));
        }

        let density = density.get::<kilogram_per_cubic_meter>();
        if !is_positive(density) {
            return Err(PhaseError::NonPhysical(format!(
                "density must be positive, got {density} kg/m³"
            )));
        }

        Ok(Self {
            molar_masses,
            density,
        })
    }

    /// Returns the mixture molar mass, in kg/mol, for the given mass fractions.
    #[must_use]
    pub fn mixture_molar_mass(&self, mass_fractions: &[f64]) -> f64 {
        let moles_per_kg: f64 = mass_fractions
            .iter()
            .zip(&self.molar_masses)
            .map(|(w, m)| w / m)
            .sum();
        1.0 / moles_per_kg
    }

    fn mass_fractions(&self, composition: &Composition) -> Result<Vec<f64>, PhaseError> {
        let n = self.molar_masses.len();
        if composition.len() != n {
            return Err(PhaseError::InvalidComposition(format!(
                "expected {n} components, found {}",
                composition.len()
            )));
        }

        match composition {
            Composition::MassFractions(w) | Composition::MassConcentrations(w) => normalize(w),
            Composition::MoleFractions(x) | Composition::MoleConcentrations(x) => {
                let masses: Vec<f64> = x
                    .iter()
                    .zip(&self.molar_masses)
                    .map(|(x, m)| x * m)
                    .collect();
                normalize(&masses)
            }
        }
    }
}

impl PhaseModel for ConstantDensity {
    fn num_components(&self) -> usize {
        self.molar_masses.len()
    }

    fn recompute(&self, request: &PhaseRequest) -> Result<PhaseState, PhaseError> {
        let mass_fractions = self.mass_fractions(&request.composition)?;
        let molar_mass = self.mixture_molar_mass(&mass_fractions);

        let mass = match request.basis {
            FlowBasis::Mass => request.flows.mass,
            FlowBasis::Mole => request.flows.mole * molar_mass,
            FlowBasis::Volume => request.flows.vol * self.density,
        };
        if !(mass.is_finite() && mass >= 0.0) {
            return Err(PhaseError::NonPhysical(format!(
                "mass flow must be finite and non-negative, got {mass} kg/s"
            )));
        }

        Ok(PhaseState {
            flows: Flows {
                mass,
                mole: mass / molar_mass,
                vol: mass / self.density,
            },
            mass_fractions,
        })
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Scales non-negative amounts to fractions summing to one.
fn normalize(amounts: &[f64]) -> Result<Vec<f64>, PhaseError> {
    if amounts.iter().any(|a| !(a.is_finite() && *a >= 0.0)) {
        return Err(PhaseError::InvalidComposition(
            "amounts must be finite and non-negative".into(),
        ));
    }

    let total: f64 = amounts.iter().sum();
    if total <= 0.0 {
        return Err(PhaseError::InvalidComposition(
            "amounts must not all be zero".into(),
        ));
    }

    Ok(amounts.iter().map(|a| a / total).collect())
}
