mod builder;
mod update;

pub use builder::StreamBuilder;
pub use update::PhaseUpdate;

use ndarray::{Array1, Array2, ArrayView1, s};
use tributary_components::interpolation::{
    Resolved, TimeQuery, TimeSeriesResolver, UpstreamHistory, UpstreamInterpolant,
};
use tributary_core::{
    Component,
    constraint::{NonNegative, StrictlyPositive},
};
use uom::si::{
    f64::{MassRate, Pressure, ThermodynamicTemperature, VolumeRate},
    mass_rate::kilogram_per_second,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
    volume_rate::cubic_meter_per_second,
};

use crate::{
    Attribute, ControlLaw, ControllableSet, DynamicInlet, InletBinding, InputSource, InputValues,
    PhaseKind, PhaseModel, StreamError,
    model::{Composition, FlowBasis, Flows, PhaseRequest},
};

/// A flowing material of one phase with time-dependent inputs.
///
/// Streams are created with [`Stream::builder`].
/// Flow rates are kept consistent by a [`PhaseModel`]: they change only
/// through [`Stream::update_phase`] and the methods built on it.
///
/// # Example
///
/// ```
/// use tributary_thermo::{Attribute, InputValues, PhaseKind, Stream, model::ConstantDensity};
/// use uom::si::{
///     f64::{MassDensity, MassRate, MolarMass},
///     mass_density::kilogram_per_cubic_meter,
///     mass_rate::kilogram_per_second,
///     molar_mass::kilogram_per_mole,
/// };
///
/// let model = ConstantDensity::new(
///     &[MolarMass::new::<kilogram_per_mole>(0.018)],
///     MassDensity::new::<kilogram_per_cubic_meter>(1000.0),
/// )
/// .unwrap();
///
/// let mut feed = Stream::builder(PhaseKind::Liquid, "feed")
///     .mass_rate(MassRate::new::<kilogram_per_second>(5.0))
///     .build(&model)
///     .unwrap();
/// assert_eq!(feed.evaluate_inputs(42.0).unwrap().get(Attribute::MassFlow), Some(5.0));
///
/// feed.attach_inlet(|t: f64| InputValues::new().with(Attribute::MassFlow, 2.0 * t));
/// assert_eq!(feed.evaluate_inputs(3.0).unwrap().get(Attribute::MassFlow), Some(6.0));
/// ```
#[derive(Debug)]
pub struct Stream {
    name: String,
    kind: PhaseKind,
    controllable: ControllableSet,
    flows: Flows,
    temperature: f64,
    pressure: f64,
    mass_fractions: Vec<f64>,
    controls: ControlLaw,
    resolver: TimeSeriesResolver,
    source: InputSource,
    upstream: Option<UpstreamInterpolant>,
}

impl Stream {
    /// Starts building a stream of the given phase.
    #[must_use]
    pub fn builder(kind: PhaseKind, name: impl Into<String>) -> StreamBuilder {
        StreamBuilder::new(kind, name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    #[must_use]
    pub fn controllable(&self) -> &ControllableSet {
        &self.controllable
    }

    #[must_use]
    pub fn controls(&self) -> &ControlLaw {
        &self.controls
    }

    #[must_use]
    pub fn source(&self) -> &InputSource {
        &self.source
    }

    /// Returns the cached flow rates in SI units.
    #[must_use]
    pub fn flows(&self) -> Flows {
        self.flows
    }

    #[must_use]
    pub fn mass_rate(&self) -> MassRate {
        MassRate::new::<kilogram_per_second>(self.flows.mass)
    }

    #[must_use]
    pub fn volume_rate(&self) -> VolumeRate {
        VolumeRate::new::<cubic_meter_per_second>(self.flows.vol)
    }

    #[must_use]
    pub fn temperature(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(self.temperature)
    }

    #[must_use]
    pub fn pressure(&self) -> Pressure {
        Pressure::new::<pascal>(self.pressure)
    }

    #[must_use]
    pub fn mass_fractions(&self) -> &[f64] {
        &self.mass_fractions
    }

    /// Returns the current value of an attribute in SI units.
    #[must_use]
    pub fn value(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::MassFlow => self.flows.mass,
            Attribute::MoleFlow => self.flows.mole,
            Attribute::VolFlow => self.flows.vol,
            Attribute::Temperature => self.temperature,
            Attribute::Pressure => self.pressure,
        }
    }

    /// Attaches a dynamic inlet, which becomes the only input source.
    ///
    /// The inlet is bound to this stream before it is stored.
    /// Any previously attached inlet is dropped.
    pub fn attach_inlet<I>(&mut self, mut inlet: I)
    where
        I: DynamicInlet + 'static,
    {
        inlet.bind(InletBinding::new(&self.name, &self.controllable));
        tracing::debug!(stream = %self.name, "attached dynamic inlet");
        self.source = InputSource::Inlet(Box::new(inlet));
    }

    /// Detaches and returns the dynamic inlet, restoring static inputs.
    pub fn detach_inlet(&mut self) -> Option<Box<dyn DynamicInlet>> {
        match std::mem::take(&mut self.source) {
            InputSource::Inlet(inlet) => {
                tracing::debug!(stream = %self.name, "detached dynamic inlet");
                Some(inlet)
            }
            InputSource::Static => None,
        }
    }

    /// Returns the stream inputs at `time`.
    ///
    /// Without an inlet, this is the current value of every controllable
    /// attribute and `time` is ignored.
    /// With an inlet, the inlet's output is returned as is.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Inlet`] if the inlet fails.
    /// - [`StreamError::NotControllable`] if the inlet reports an attribute
    ///   outside the controllable set.
    pub fn evaluate_inputs(&self, time: f64) -> Result<InputValues, StreamError> {
        match &self.source {
            InputSource::Static => Ok(self
                .controllable
                .iter()
                .map(|attribute| (attribute, self.value(attribute)))
                .collect()),
            InputSource::Inlet(inlet) => {
                let inputs = inlet.evaluate_inputs(time).map_err(StreamError::Inlet)?;
                if let Some(attribute) = inputs
                    .attributes()
                    .find(|&attribute| !self.controllable.contains(attribute))
                {
                    return Err(StreamError::NotControllable { attribute });
                }
                Ok(inputs)
            }
        }
    }

    /// Attaches upstream history, replacing any already attached.
    ///
    /// The first columns of `values` follow the controllable set; any further
    /// columns are carried along (typically composition).
    ///
    /// # Errors
    ///
    /// - [`StreamError::UnsupportedPhase`] unless this is a liquid stream.
    /// - [`StreamError::Interp`] if the history is empty, unsorted, non-finite
    ///   or misaligned.
    /// - [`StreamError::ShapeMismatch`] if there are fewer columns than
    ///   controllable attributes.
    pub fn attach_upstream<T>(&mut self, times: T, values: Array2<f64>) -> Result<(), StreamError>
    where
        T: Into<Array1<f64>>,
    {
        self.require_liquid("upstream interpolation")?;

        let history = UpstreamHistory::new(times, values)?;
        if history.num_channels() < self.controllable.len() {
            return Err(StreamError::ShapeMismatch {
                what: "upstream channels",
                expected: self.controllable.len(),
                found: history.num_channels(),
            });
        }

        tracing::debug!(stream = %self.name, "attached upstream history");
        self.upstream = Some(UpstreamInterpolant::new(history, self.resolver));
        Ok(())
    }

    /// Removes and returns the upstream history, if any.
    pub fn detach_upstream(&mut self) -> Option<UpstreamHistory> {
        self.upstream
            .take()
            .map(|interpolant| interpolant.history().clone())
    }

    #[must_use]
    pub fn upstream(&self) -> Option<&UpstreamHistory> {
        self.upstream.as_ref().map(UpstreamInterpolant::history)
    }

    /// Evaluates upstream history at one time or many.
    ///
    /// A single time is clamped to the history horizon and answered with a
    /// local polynomial fit.
    /// A sequence of times is answered with a global spline, held flat past
    /// the horizon.
    ///
    /// # Errors
    ///
    /// - [`StreamError::UnsupportedPhase`] unless this is a liquid stream.
    /// - [`StreamError::NoUpstreamHistory`] if no history is attached.
    /// - [`StreamError::Interp`] if evaluation fails.
    pub fn interpolate_inputs(&self, query: impl Into<TimeQuery>) -> Result<Resolved, StreamError> {
        Ok(self.interpolant()?.call(query.into())?)
    }

    /// Evaluates upstream history at a single time.
    ///
    /// # Errors
    ///
    /// See [`Stream::interpolate_inputs`].
    pub fn interpolate_inputs_at(&self, time: f64) -> Result<Array1<f64>, StreamError> {
        let interpolant = self.interpolant()?;
        Ok(interpolant
            .resolver()
            .resolve_at(interpolant.history(), time)?)
    }

    /// Evaluates upstream history at every time in `times`.
    ///
    /// # Errors
    ///
    /// See [`Stream::interpolate_inputs`].
    pub fn interpolate_inputs_over(
        &self,
        times: ArrayView1<f64>,
    ) -> Result<Array2<f64>, StreamError> {
        let interpolant = self.interpolant()?;
        Ok(interpolant
            .resolver()
            .resolve_over(interpolant.history(), times)?)
    }

    /// Returns interpolated controllable inputs at `time`, labelled.
    ///
    /// Channels beyond the controllable set are dropped.
    ///
    /// # Errors
    ///
    /// See [`Stream::interpolate_inputs`].
    pub fn interpolated_inputs(&self, time: f64) -> Result<InputValues, StreamError> {
        let row = self.interpolate_inputs_at(time)?;
        self.controllable
            .label(row.slice(s![..self.controllable.len()]))
    }

    /// Recomputes flows and composition through `model`.
    ///
    /// Flows not set in `update` keep their cached values.
    /// The governing flow is the first one set among mass, mole and volume;
    /// with none set, the current mass flow governs.
    /// Composition is replaced only if `update` carries one.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Constraint`] for a negative or NaN flow.
    /// - [`StreamError::Phase`] if the model rejects the request, including
    ///   when more than one composition input is given.
    ///
    /// The stream is left unchanged on error.
    pub fn update_phase<M>(&mut self, model: &M, update: PhaseUpdate) -> Result<(), StreamError>
    where
        M: PhaseModel,
    {
        self.update_state(model, update, self.temperature, self.pressure)
    }

    /// Applies labelled inputs to the stream.
    ///
    /// Temperature and pressure are set directly.
    /// Flow inputs go through [`Stream::update_phase`].
    ///
    /// # Errors
    ///
    /// - [`StreamError::NotControllable`] for an attribute outside the set.
    /// - [`StreamError::Constraint`] for a negative flow or a non-positive
    ///   temperature or pressure.
    /// - Any error from [`Stream::update_phase`].
    ///
    /// The stream is left unchanged on error.
    pub fn apply_inputs<M>(&mut self, model: &M, inputs: &InputValues) -> Result<(), StreamError>
    where
        M: PhaseModel,
    {
        let mut update = PhaseUpdate::default();
        let mut temperature = self.temperature;
        let mut pressure = self.pressure;

        for (attribute, value) in inputs.iter() {
            if !self.controllable.contains(attribute) {
                return Err(StreamError::NotControllable { attribute });
            }
            match attribute {
                Attribute::MassFlow => update.mass_flow = Some(value),
                Attribute::MoleFlow => update.mole_flow = Some(value),
                Attribute::VolFlow => update.vol_flow = Some(value),
                Attribute::Temperature => temperature = positive(attribute, value)?,
                Attribute::Pressure => pressure = positive(attribute, value)?,
            }
        }

        self.update_state(model, update, temperature, pressure)
    }

    /// Evaluates every control law at `time` and applies the result.
    ///
    /// # Errors
    ///
    /// See [`Stream::apply_inputs`].
    pub fn apply_controls<M>(&mut self, model: &M, time: f64) -> Result<(), StreamError>
    where
        M: PhaseModel,
    {
        if self.controls.is_empty() {
            return Ok(());
        }
        let inputs = self.controls.evaluate(time);
        tracing::trace!(stream = %self.name, time, "applying control laws");
        self.apply_inputs(model, &inputs)
    }

    fn interpolant(&self) -> Result<&UpstreamInterpolant, StreamError> {
        self.require_liquid("upstream interpolation")?;
        self.upstream
            .as_ref()
            .ok_or_else(|| StreamError::NoUpstreamHistory {
                stream: self.name.clone(),
            })
    }

    fn require_liquid(&self, operation: &'static str) -> Result<(), StreamError> {
        if self.kind == PhaseKind::Liquid {
            Ok(())
        } else {
            Err(StreamError::UnsupportedPhase {
                kind: self.kind,
                operation,
            })
        }
    }

    /// Validates `update`, runs the model and commits the result.
    fn update_state<M>(
        &mut self,
        model: &M,
        update: PhaseUpdate,
        temperature: f64,
        pressure: f64,
    ) -> Result<(), StreamError>
    where
        M: PhaseModel,
    {
        let basis = update.basis();
        let flows = Flows {
            mass: non_negative(Attribute::MassFlow, update.mass_flow)?.unwrap_or(self.flows.mass),
            mole: non_negative(Attribute::MoleFlow, update.mole_flow)?.unwrap_or(self.flows.mole),
            vol: non_negative(Attribute::VolFlow, update.vol_flow)?.unwrap_or(self.flows.vol),
        };
        let composition = update
            .into_composition()?
            .unwrap_or_else(|| Composition::MassFractions(self.mass_fractions.clone()));

        self.recompute(model, basis, flows, composition, temperature, pressure)
    }

    fn recompute<M>(
        &mut self,
        model: &M,
        basis: FlowBasis,
        flows: Flows,
        composition: Composition,
        temperature: f64,
        pressure: f64,
    ) -> Result<(), StreamError>
    where
        M: PhaseModel,
    {
        let request = PhaseRequest {
            basis,
            flows,
            composition,
            temperature,
            pressure,
        };
        let state = model.recompute(&request)?;

        tracing::trace!(
            stream = %self.name,
            mass_flow = state.flows.mass,
            mole_flow = state.flows.mole,
            vol_flow = state.flows.vol,
            "recomputed phase"
        );
        self.flows = state.flows;
        self.mass_fractions = state.mass_fractions;
        self.temperature = temperature;
        self.pressure = pressure;
        Ok(())
    }
}

fn non_negative(attribute: Attribute, value: Option<f64>) -> Result<Option<f64>, StreamError> {
    value
        .map(|v| {
            NonNegative::new(v)
                .map(|v| v.into_inner())
                .map_err(|source| StreamError::Constraint { attribute, source })
        })
        .transpose()
}

fn positive(attribute: Attribute, value: f64) -> Result<f64, StreamError> {
    StrictlyPositive::new(value)
        .map(|v| v.into_inner())
        .map_err(|source| StreamError::Constraint { attribute, source })
}
