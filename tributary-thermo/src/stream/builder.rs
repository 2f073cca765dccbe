use tributary_components::interpolation::{InterpolationConfig, TimeSeriesResolver};
use uom::si::{
    f64::{MassRate, Pressure, ThermodynamicTemperature, VolumeRate},
    mass_rate::kilogram_per_second,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    volume_rate::cubic_meter_per_second,
};

use crate::{
    Attribute, ControlLaw, ControllableSet, InputSource, PhaseKind, PhaseModel, StreamError,
    model::{Composition, FlowBasis, Flows},
};

use super::{Stream, non_negative, positive};

const STANDARD_TEMPERATURE: f64 = 298.15;
const STANDARD_PRESSURE: f64 = 101_325.0;

/// Configures and builds a [`Stream`].
///
/// Defaults: 298.15 K, 101 325 Pa, zero mass flow, equal mass fractions of
/// every component in the model, the phase's default controllable set, no
/// control laws, and the default [`InterpolationConfig`].
#[derive(Debug)]
pub struct StreamBuilder {
    kind: PhaseKind,
    name: String,
    temperature: f64,
    pressure: f64,
    flow: (FlowBasis, f64),
    composition: Option<Composition>,
    controllable: Option<ControllableSet>,
    controls: ControlLaw,
    config: InterpolationConfig,
}

impl StreamBuilder {
    pub(super) fn new(kind: PhaseKind, name: String) -> Self {
        Self {
            kind,
            name,
            temperature: STANDARD_TEMPERATURE,
            pressure: STANDARD_PRESSURE,
            flow: (FlowBasis::Mass, 0.0),
            composition: None,
            controllable: None,
            controls: ControlLaw::new(),
            config: InterpolationConfig::default(),
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: ThermodynamicTemperature) -> Self {
        self.temperature = temperature.get::<kelvin>();
        self
    }

    #[must_use]
    pub fn pressure(mut self, pressure: Pressure) -> Self {
        self.pressure = pressure.get::<pascal>();
        self
    }

    /// Sets the initial flow on a mass basis, replacing any other basis.
    #[must_use]
    pub fn mass_rate(mut self, rate: MassRate) -> Self {
        self.flow = (FlowBasis::Mass, rate.get::<kilogram_per_second>());
        self
    }

    /// Sets the initial flow on a molar basis, in mol/s.
    #[must_use]
    pub fn mole_flow(mut self, rate: f64) -> Self {
        self.flow = (FlowBasis::Mole, rate);
        self
    }

    /// Sets the initial flow on a volumetric basis.
    #[must_use]
    pub fn volume_rate(mut self, rate: VolumeRate) -> Self {
        self.flow = (FlowBasis::Volume, rate.get::<cubic_meter_per_second>());
        self
    }

    #[must_use]
    pub fn composition(mut self, composition: Composition) -> Self {
        self.composition = Some(composition);
        self
    }

    /// Replaces the phase's default controllable set.
    #[must_use]
    pub fn controllable(mut self, controllable: ControllableSet) -> Self {
        self.controllable = Some(controllable);
        self
    }

    /// Adds a control law, applied at time zero when the stream is built.
    #[must_use]
    pub fn control<F>(mut self, attribute: Attribute, law: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        self.controls.insert(attribute, law);
        self
    }

    #[must_use]
    pub fn controls(mut self, controls: ControlLaw) -> Self {
        self.controls = controls;
        self
    }

    #[must_use]
    pub fn config(mut self, config: InterpolationConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the stream and brings it to a consistent initial state.
    ///
    /// The phase model runs once on the initial flow and composition, then
    /// every control law is applied at time zero.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Interp`] if the interpolation config is invalid.
    /// - [`StreamError::NotControllable`] if a control law targets an
    ///   attribute outside the controllable set.
    /// - [`StreamError::Constraint`] for a negative flow or a non-positive
    ///   temperature or pressure.
    /// - [`StreamError::Phase`] if the model rejects the initial state.
    pub fn build<M>(self, model: &M) -> Result<Stream, StreamError>
    where
        M: PhaseModel,
    {
        let resolver = TimeSeriesResolver::new(&self.config)?;

        let controllable = self
            .controllable
            .unwrap_or_else(|| ControllableSet::for_phase(self.kind));
        if let Some(attribute) = self
            .controls
            .attributes()
            .find(|&attribute| !controllable.contains(attribute))
        {
            return Err(StreamError::NotControllable { attribute });
        }

        let temperature = positive(Attribute::Temperature, self.temperature)?;
        let pressure = positive(Attribute::Pressure, self.pressure)?;

        let (basis, rate) = self.flow;
        let attribute = match basis {
            FlowBasis::Mass => Attribute::MassFlow,
            FlowBasis::Mole => Attribute::MoleFlow,
            FlowBasis::Volume => Attribute::VolFlow,
        };
        let rate = non_negative(attribute, Some(rate))?.unwrap_or_default();
        let flows = match basis {
            FlowBasis::Mass => Flows {
                mass: rate,
                ..Flows::default()
            },
            FlowBasis::Mole => Flows {
                mole: rate,
                ..Flows::default()
            },
            FlowBasis::Volume => Flows {
                vol: rate,
                ..Flows::default()
            },
        };

        let composition = self
            .composition
            .unwrap_or_else(|| Composition::MassFractions(vec![1.0; model.num_components()]));

        let mut stream = Stream {
            name: self.name,
            kind: self.kind,
            controllable,
            flows,
            temperature,
            pressure,
            mass_fractions: Vec::new(),
            controls: self.controls,
            resolver,
            source: InputSource::Static,
            upstream: None,
        };
        stream.recompute(model, basis, flows, composition, temperature, pressure)?;
        stream.apply_controls(model, 0.0)?;

        tracing::debug!(
            stream = %stream.name,
            kind = %stream.kind,
            controllable = stream.controllable.len(),
            "built stream"
        );
        Ok(stream)
    }
}
