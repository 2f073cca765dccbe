use crate::{
    PhaseError,
    model::{Composition, FlowBasis},
};

/// A partial change to a stream's phase.
///
/// Unset flows keep their current values.
/// At most one of the four composition inputs may be set.
///
/// ```
/// use tributary_thermo::PhaseUpdate;
///
/// let update = PhaseUpdate {
///     mass_flow: Some(2.0),
///     mole_frac: Some(vec![0.9, 0.1]),
///     ..PhaseUpdate::default()
/// };
/// # let _ = update;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseUpdate {
    /// Mass flow, in kg/s.
    pub mass_flow: Option<f64>,
    /// Molar flow, in mol/s.
    pub mole_flow: Option<f64>,
    /// Volumetric flow, in m³/s.
    pub vol_flow: Option<f64>,
    pub mass_frac: Option<Vec<f64>>,
    pub mole_frac: Option<Vec<f64>>,
    /// Mass concentrations, in kg/m³.
    pub mass_conc: Option<Vec<f64>>,
    /// Molar concentrations, in mol/m³.
    pub concentration: Option<Vec<f64>>,
}

impl PhaseUpdate {
    /// Returns the flow that governs the update.
    pub(crate) fn basis(&self) -> FlowBasis {
        if self.mass_flow.is_some() {
            FlowBasis::Mass
        } else if self.mole_flow.is_some() {
            FlowBasis::Mole
        } else if self.vol_flow.is_some() {
            FlowBasis::Volume
        } else {
            FlowBasis::Mass
        }
    }

    /// Extracts the composition input, if exactly one was given.
    pub(crate) fn into_composition(self) -> Result<Option<Composition>, PhaseError> {
        let mut given = [
            self.mass_frac.map(Composition::MassFractions),
            self.mole_frac.map(Composition::MoleFractions),
            self.mass_conc.map(Composition::MassConcentrations),
            self.concentration.map(Composition::MoleConcentrations),
        ]
        .into_iter()
        .flatten();

        let composition = given.next();
        let extra = given.count();
        if extra > 0 {
            return Err(PhaseError::ConflictingComposition { count: extra + 1 });
        }
        Ok(composition)
    }
}
