use std::{cell::Cell, rc::Rc};

use approx::assert_relative_eq;
use ndarray::{Array2, array};
use tributary_components::interpolation::{InterpError, InterpolationConfig, Resolved, TimeQuery};
use tributary_thermo::{
    Attribute, ControlLaw, ControlledInlet, ControllableSet, DynamicInlet, InletBinding,
    InletError, InputValues, PhaseError, PhaseKind, PhaseUpdate, Stream, StreamError,
    model::{Composition, ConstantDensity},
};
use uom::si::{
    f64::{MassDensity, MassRate, MolarMass, ThermodynamicTemperature},
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    molar_mass::kilogram_per_mole,
    thermodynamic_temperature::kelvin,
};

fn water() -> ConstantDensity {
    ConstantDensity::new(
        &[MolarMass::new::<kilogram_per_mole>(0.018)],
        MassDensity::new::<kilogram_per_cubic_meter>(1000.0),
    )
    .unwrap()
}

fn binary() -> ConstantDensity {
    ConstantDensity::new(
        &[
            MolarMass::new::<kilogram_per_mole>(0.018),
            MolarMass::new::<kilogram_per_mole>(0.046),
        ],
        MassDensity::new::<kilogram_per_cubic_meter>(900.0),
    )
    .unwrap()
}

/// A liquid stream whose only controllable input is the mass flow.
fn mass_controlled(name: &str) -> Stream {
    Stream::builder(PhaseKind::Liquid, name)
        .controllable(ControllableSet::new([Attribute::MassFlow]).unwrap())
        .build(&water())
        .unwrap()
}

fn squares() -> (Vec<f64>, Array2<f64>) {
    (
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        array![[0.0], [1.0], [4.0], [9.0], [16.0]],
    )
}

#[test]
fn static_stream_reports_current_state_at_any_time() {
    let stream = Stream::builder(PhaseKind::Liquid, "feed")
        .controllable(ControllableSet::new([Attribute::MassFlow, Attribute::Temperature]).unwrap())
        .mass_rate(MassRate::new::<kilogram_per_second>(5.0))
        .temperature(ThermodynamicTemperature::new::<kelvin>(300.0))
        .build(&water())
        .unwrap();

    let expected = InputValues::new()
        .with(Attribute::MassFlow, 5.0)
        .with(Attribute::Temperature, 300.0);
    for time in [0.0, 7.5, 1e6] {
        assert_eq!(stream.evaluate_inputs(time).unwrap(), expected);
    }
}

#[test]
fn static_inputs_follow_controllable_order() {
    let stream = Stream::builder(PhaseKind::Solid, "cake")
        .mass_rate(MassRate::new::<kilogram_per_second>(1.8))
        .build(&water())
        .unwrap();

    let inputs = stream.evaluate_inputs(0.0).unwrap();
    assert_eq!(
        inputs.attributes().collect::<Vec<_>>(),
        vec![Attribute::MassFlow, Attribute::MoleFlow, Attribute::Temperature]
    );
    assert_relative_eq!(inputs.get(Attribute::MoleFlow).unwrap(), 100.0, epsilon = 1e-9);
}

#[test]
fn dynamic_inlet_replaces_static_inputs() {
    let mut stream = mass_controlled("feed");
    stream.attach_inlet(|t: f64| InputValues::new().with(Attribute::MassFlow, 2.0 * t));

    assert!(stream.source().is_dynamic());
    assert_eq!(
        stream.evaluate_inputs(3.0).unwrap().get(Attribute::MassFlow),
        Some(6.0)
    );

    assert!(stream.detach_inlet().is_some());
    assert!(!stream.source().is_dynamic());
    assert_eq!(
        stream.evaluate_inputs(3.0).unwrap().get(Attribute::MassFlow),
        Some(0.0)
    );
    assert!(stream.detach_inlet().is_none());
}

#[test]
fn inlet_is_bound_on_attach() {
    struct Recorder {
        bound: Rc<Cell<bool>>,
    }

    impl DynamicInlet for Recorder {
        fn bind(&mut self, binding: InletBinding) {
            assert_eq!(binding.stream(), "feed");
            assert_eq!(binding.controllable().len(), 1);
            self.bound.set(true);
        }

        fn evaluate_inputs(&self, _time: f64) -> Result<InputValues, InletError> {
            Ok(InputValues::new())
        }
    }

    let bound = Rc::new(Cell::new(false));
    let mut stream = mass_controlled("feed");
    stream.attach_inlet(Recorder {
        bound: Rc::clone(&bound),
    });
    assert!(bound.get());
}

#[test]
fn inlet_values_outside_controllable_set_are_rejected() {
    let mut stream = mass_controlled("feed");
    stream.attach_inlet(|_: f64| InputValues::new().with(Attribute::Temperature, 350.0));

    assert!(matches!(
        stream.evaluate_inputs(1.0),
        Err(StreamError::NotControllable {
            attribute: Attribute::Temperature
        })
    ));
}

#[test]
fn inlet_failures_propagate() {
    struct Offline;

    impl DynamicInlet for Offline {
        fn evaluate_inputs(&self, time: f64) -> Result<InputValues, InletError> {
            Err(format!("no data at t = {time}").into())
        }
    }

    let mut stream = mass_controlled("feed");
    stream.attach_inlet(Offline);

    let Err(StreamError::Inlet(source)) = stream.evaluate_inputs(2.0) else {
        panic!("expected an inlet error");
    };
    assert_eq!(source.to_string(), "no data at t = 2");
}

#[test]
fn controlled_inlet_drives_inputs() {
    let mut stream = Stream::builder(PhaseKind::Vapor, "purge")
        .build(&water())
        .unwrap();
    stream.attach_inlet(ControlledInlet::new(
        ControlLaw::new()
            .with(Attribute::Temperature, |t| 300.0 + t)
            .with(Attribute::VolFlow, |t| 0.5 * t),
    ));

    let inputs = stream.evaluate_inputs(4.0).unwrap();
    assert_eq!(
        inputs.iter().collect::<Vec<_>>(),
        vec![(Attribute::VolFlow, 2.0), (Attribute::Temperature, 304.0)]
    );
}

#[test]
fn point_interpolation_of_upstream_history() {
    let mut stream = mass_controlled("feed");
    let (times, values) = squares();
    stream.attach_upstream(times, values).unwrap();

    let y = stream.interpolate_inputs_at(2.5).unwrap();
    assert_relative_eq!(y[0], 6.25, epsilon = 1e-12);

    // Past the horizon the stream is assumed to be at steady state.
    assert_eq!(stream.interpolate_inputs_at(10.0).unwrap()[0], 16.0);
}

#[test]
fn batch_interpolation_holds_past_horizon() {
    let mut stream = mass_controlled("feed");
    let (times, values) = squares();
    stream.attach_upstream(times, values).unwrap();

    let y = stream
        .interpolate_inputs_over(array![0.0, 2.0, 4.0, 6.0].view())
        .unwrap();
    for (actual, expected) in y.column(0).iter().zip([0.0, 4.0, 16.0, 16.0]) {
        assert_relative_eq!(*actual, expected, epsilon = 1e-12);
    }
}

#[test]
fn query_shape_selects_the_path() {
    let mut stream = mass_controlled("feed");
    let (times, values) = squares();
    stream.attach_upstream(times, values).unwrap();

    let Resolved::Point(point) = stream.interpolate_inputs(2.5).unwrap() else {
        panic!("expected a point result");
    };
    assert_eq!(point.len(), 1);

    let Resolved::Batch(batch) = stream
        .interpolate_inputs(TimeQuery::from(vec![1.0, 5.0]))
        .unwrap()
    else {
        panic!("expected a batch result");
    };
    assert_eq!(batch.dim(), (2, 1));
}

#[test]
fn interpolated_inputs_drop_composition_channels() {
    let mut stream = Stream::builder(PhaseKind::Liquid, "feed")
        .controllable(ControllableSet::new([Attribute::MassFlow, Attribute::Temperature]).unwrap())
        .build(&water())
        .unwrap();
    stream
        .attach_upstream(
            vec![0.0, 1.0, 2.0],
            array![
                [1.0, 300.0, 0.2],
                [2.0, 310.0, 0.3],
                [3.0, 320.0, 0.4]
            ],
        )
        .unwrap();

    let inputs = stream.interpolated_inputs(1.5).unwrap();
    assert_eq!(inputs.len(), 2);
    assert_relative_eq!(inputs.get(Attribute::MassFlow).unwrap(), 2.5, epsilon = 1e-12);
    assert_relative_eq!(inputs.get(Attribute::Temperature).unwrap(), 315.0, epsilon = 1e-9);
}

#[test]
fn inlet_shadows_upstream_history() {
    let mut stream = mass_controlled("feed");
    let (times, values) = squares();
    stream.attach_upstream(times, values).unwrap();
    stream.attach_inlet(|_: f64| InputValues::new().with(Attribute::MassFlow, -1.0));

    assert_eq!(
        stream.evaluate_inputs(2.0).unwrap().get(Attribute::MassFlow),
        Some(-1.0)
    );
    assert_relative_eq!(stream.interpolate_inputs_at(2.0).unwrap()[0], 4.0);
}

#[test]
fn upstream_history_is_liquid_only() {
    for kind in [PhaseKind::Solid, PhaseKind::Vapor] {
        let mut stream = Stream::builder(kind, "side").build(&water()).unwrap();
        let (times, values) = squares();

        assert!(matches!(
            stream.attach_upstream(times, values),
            Err(StreamError::UnsupportedPhase { kind: k, .. }) if k == kind
        ));
        assert!(matches!(
            stream.interpolate_inputs_at(1.0),
            Err(StreamError::UnsupportedPhase { .. })
        ));
    }
}

#[test]
fn interpolation_requires_history() {
    let stream = mass_controlled("feed");
    assert!(matches!(
        stream.interpolate_inputs(1.0),
        Err(StreamError::NoUpstreamHistory { stream: name }) if name == "feed"
    ));
}

#[test]
fn bad_histories_are_rejected_at_attach() {
    let mut stream = mass_controlled("feed");

    assert!(matches!(
        stream.attach_upstream(vec![0.0, 2.0, 1.0], array![[0.0], [1.0], [2.0]]),
        Err(StreamError::Interp(InterpError::UnsortedHistory { index: 2, .. }))
    ));
    assert!(matches!(
        stream.attach_upstream(Vec::<f64>::new(), Array2::zeros((0, 1))),
        Err(StreamError::Interp(InterpError::InsufficientHistory { .. }))
    ));
    assert!(matches!(
        stream.attach_upstream(vec![0.0, 1.0], array![[0.0]]),
        Err(StreamError::Interp(InterpError::ShapeMismatch { .. }))
    ));
    assert!(matches!(
        stream.attach_upstream(vec![0.0, 1.0], array![[0.0], [f64::NAN]]),
        Err(StreamError::Interp(InterpError::NonFiniteSample { row: 1, column: 0 }))
    ));
    assert!(stream.upstream().is_none());

    let mut liquid = Stream::builder(PhaseKind::Liquid, "full")
        .build(&water())
        .unwrap();
    assert!(matches!(
        liquid.attach_upstream(vec![0.0, 1.0], array![[0.0, 1.0], [1.0, 2.0]]),
        Err(StreamError::ShapeMismatch {
            expected: 4,
            found: 2,
            ..
        })
    ));
}

#[test]
fn config_is_read_from_json() {
    let config: InterpolationConfig = serde_json::from_str(r#"{ "num_points": 4 }"#).unwrap();
    let mut stream = Stream::builder(PhaseKind::Liquid, "feed")
        .controllable(ControllableSet::new([Attribute::MassFlow]).unwrap())
        .config(config)
        .build(&water())
        .unwrap();
    let (times, values) = squares();
    stream.attach_upstream(times, values).unwrap();

    assert_relative_eq!(stream.interpolate_inputs_at(1.5).unwrap()[0], 2.25, epsilon = 1e-12);
}

#[test]
fn controls_can_be_reapplied_later() {
    let model = water();
    let mut stream = Stream::builder(PhaseKind::Liquid, "feed")
        .control(Attribute::MassFlow, |t| 1.0 + t)
        .build(&model)
        .unwrap();
    assert_relative_eq!(stream.value(Attribute::MassFlow), 1.0);

    stream.apply_controls(&model, 2.0).unwrap();
    assert_relative_eq!(stream.value(Attribute::MassFlow), 3.0);
    assert_relative_eq!(stream.value(Attribute::VolFlow), 0.003, epsilon = 1e-15);
}

#[test]
fn phase_update_keeps_flows_consistent() {
    let model = binary();
    let mut stream = Stream::builder(PhaseKind::Liquid, "feed")
        .mass_rate(MassRate::new::<kilogram_per_second>(2.0))
        .composition(Composition::MassFractions(vec![0.5, 0.5]))
        .build(&model)
        .unwrap();

    stream
        .update_phase(
            &model,
            PhaseUpdate {
                mole_flow: Some(50.0),
                mole_frac: Some(vec![1.0, 0.0]),
                ..PhaseUpdate::default()
            },
        )
        .unwrap();

    let flows = stream.flows();
    assert_relative_eq!(flows.mole, 50.0, epsilon = 1e-9);
    assert_relative_eq!(flows.mass, 0.9, epsilon = 1e-12);
    assert_relative_eq!(flows.vol, 0.001, epsilon = 1e-15);
    assert_eq!(stream.mass_fractions(), &[1.0, 0.0]);
}

#[test]
fn failed_update_leaves_stream_unchanged() {
    let model = binary();
    let mut stream = Stream::builder(PhaseKind::Liquid, "feed")
        .mass_rate(MassRate::new::<kilogram_per_second>(2.0))
        .build(&model)
        .unwrap();
    let before = (stream.flows(), stream.mass_fractions().to_vec());

    let conflicting = PhaseUpdate {
        mass_flow: Some(4.0),
        mass_frac: Some(vec![0.2, 0.8]),
        mole_frac: Some(vec![0.2, 0.8]),
        ..PhaseUpdate::default()
    };
    assert!(matches!(
        stream.update_phase(&model, conflicting),
        Err(StreamError::Phase(PhaseError::ConflictingComposition { count: 2 }))
    ));

    let negative = PhaseUpdate {
        vol_flow: Some(-1.0),
        ..PhaseUpdate::default()
    };
    assert!(matches!(
        stream.update_phase(&model, negative),
        Err(StreamError::Constraint {
            attribute: Attribute::VolFlow,
            ..
        })
    ));

    assert_eq!((stream.flows(), stream.mass_fractions().to_vec()), before);
}

#[test]
fn apply_inputs_respects_controllable_set() {
    let model = water();
    let mut stream = mass_controlled("feed");

    let result = stream.apply_inputs(
        &model,
        &InputValues::new()
            .with(Attribute::MassFlow, 4.0)
            .with(Attribute::Pressure, 2e5),
    );
    assert!(matches!(
        result,
        Err(StreamError::NotControllable {
            attribute: Attribute::Pressure
        })
    ));
    assert_eq!(stream.value(Attribute::MassFlow), 0.0);

    stream
        .apply_inputs(&model, &InputValues::new().with(Attribute::MassFlow, 4.0))
        .unwrap();
    assert_eq!(stream.value(Attribute::MassFlow), 4.0);
}
