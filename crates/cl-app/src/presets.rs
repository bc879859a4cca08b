//! Ready-made studies.
//!
//! Each preset is a plain value; callers are free to tweak it before running.

use cl_controls::{DerivativeMode, DesignTarget, IntegrationRule, OutputLimits, PIDGains};
use cl_ident::{ExcitationConfig, IdentifyOptions};
use cl_sim::{ControlMode, PlantParameters, Scenario, SimOptions};

use crate::error::{AppError, AppResult};
use crate::study::{
    ComparisonStudy, IdentificationStudy, NamedScenario, NamedTarget, Study, TuningStudy,
};

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: [&str; 5] = [
    "thermal",
    "tuning",
    "no-overshoot",
    "elevator",
    "identification",
];

const THERMAL_REFERENCE: f64 = 22.0;
const THERMAL_AMBIENT: f64 = 15.0;

/// Room heater: K = 1, τ = 1 s, ζ = 0.5.
pub fn thermal_plant() -> PlantParameters {
    PlantParameters {
        gain: 1.0,
        time_constant: 1.0,
        damping: 0.5,
    }
}

fn thermal_limits() -> OutputLimits {
    OutputLimits { min: 0.0, max: 50.0 }
}

fn thermal_scenario(mode: ControlMode) -> Scenario {
    Scenario::new(thermal_plant(), THERMAL_REFERENCE)
        .with_ambient(THERMAL_AMBIENT)
        .with_initial(THERMAL_AMBIENT)
        .with_limits(thermal_limits())
        .with_mode(mode)
}

fn named(name: &str, scenario: Scenario) -> NamedScenario {
    NamedScenario {
        name: name.to_string(),
        scenario,
    }
}

fn target(name: &str, damping: f64, natural_frequency: f64) -> NamedTarget {
    NamedTarget {
        name: name.to_string(),
        target: DesignTarget {
            damping,
            natural_frequency,
        },
    }
}

fn filtered_pid(gains: PIDGains) -> ControlMode {
    ControlMode::Pid {
        gains,
        derivative: DerivativeMode::filtered_measurement(),
        integration: IntegrationRule::Rectangular,
    }
}

/// Open loop vs. P vs. PI on the thermal plant, 20 s.
pub fn thermal_comparison() -> ComparisonStudy {
    let open_input = (THERMAL_REFERENCE - THERMAL_AMBIENT) * 2.0;
    ComparisonStudy {
        sim: SimOptions {
            dt: 0.01,
            t_sim: 20.0,
        },
        runs: vec![
            named(
                "Open loop",
                thermal_scenario(ControlMode::OpenLoop { input: open_input }),
            ),
            named(
                "P",
                thermal_scenario(ControlMode::Proportional { kp: 1.5 }),
            ),
            named(
                "PID",
                thermal_scenario(ControlMode::pid(PIDGains {
                    kp: 1.5,
                    ki: 1.0,
                    kd: 0.0,
                })),
            ),
        ],
    }
}

/// Pole-placement designs for three damping regimes on the thermal plant.
pub fn analytic_tuning() -> TuningStudy {
    TuningStudy {
        sim: SimOptions {
            dt: 0.01,
            t_sim: 50.0,
        },
        plant: thermal_plant(),
        reference: THERMAL_REFERENCE,
        ambient: THERMAL_AMBIENT,
        initial: THERMAL_AMBIENT,
        limits: thermal_limits(),
        derivative: DerivativeMode::filtered_measurement(),
        integration: IntegrationRule::Rectangular,
        targets: vec![
            target("Underdamped", 0.3, 0.8),
            target("Critical", 1.0, 0.6),
            target("Overdamped", 1.1, 0.4),
        ],
    }
}

/// Hand-picked gains aimed at a gentle approach, 40 s.
///
/// Plain PID: derivative on the error, trapezoidal integration.
pub fn no_overshoot_comparison() -> ComparisonStudy {
    let presets = [
        ("Very soft", 2.0, 0.8, 8.0),
        ("Balanced", 3.5, 1.5, 6.0),
        ("Fast", 5.0, 2.0, 4.0),
    ];
    ComparisonStudy {
        sim: SimOptions {
            dt: 0.01,
            t_sim: 40.0,
        },
        runs: presets
            .into_iter()
            .map(|(name, kp, ki, kd)| {
                named(name, thermal_scenario(ControlMode::pid(PIDGains { kp, ki, kd })))
            })
            .collect(),
    }
}

/// Elevator position loop: K = 1, τ = 2 s, ζ = 0.7, step to 10 from rest.
///
/// The raw derivative-on-error run kicks the actuator to its limit on the
/// first closed-loop sample; the filtered run does not.
pub fn elevator_comparison() -> ComparisonStudy {
    let plant = PlantParameters {
        gain: 1.0,
        time_constant: 2.0,
        damping: 0.7,
    };
    let gains = PIDGains {
        kp: 3.0,
        ki: 0.5,
        kd: 4.0,
    };
    let scenario = |mode| {
        Scenario::new(plant, 10.0)
            .with_limits(OutputLimits {
                min: -1000.0,
                max: 1000.0,
            })
            .with_mode(mode)
    };
    ComparisonStudy {
        sim: SimOptions {
            dt: 0.01,
            t_sim: 20.0,
        },
        runs: vec![
            named("PID", scenario(ControlMode::pid(gains))),
            named("PID filtered", scenario(filtered_pid(gains))),
        ],
    }
}

/// Identify K = 1.2, τ = 1.5 s, ζ = 0.6 and design PI gains on the model.
pub fn identification() -> IdentificationStudy {
    IdentificationStudy {
        sim: SimOptions {
            dt: 0.01,
            t_sim: 50.0,
        },
        plant: PlantParameters {
            gain: 1.2,
            time_constant: 1.5,
            damping: 0.6,
        },
        excitation: ExcitationConfig::default(),
        options: IdentifyOptions::default(),
        targets: vec![
            target("Underdamped", 0.7, 0.8),
            target("Critical", 1.0, 0.6),
            target("Overdamped", 1.3, 0.4),
        ],
    }
}

/// Look up a preset by one of [`PRESET_NAMES`].
pub fn by_name(name: &str) -> AppResult<Study> {
    let study = match name {
        "thermal" => Study::Comparison(thermal_comparison()),
        "tuning" => Study::Tuning(analytic_tuning()),
        "no-overshoot" => Study::Comparison(no_overshoot_comparison()),
        "elevator" => Study::Comparison(elevator_comparison()),
        "identification" => Study::Identification(identification()),
        other => return Err(AppError::UnknownPreset(other.to_string())),
    };
    Ok(study)
}
