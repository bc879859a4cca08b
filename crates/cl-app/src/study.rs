//! Studies: batches of independent runs plus their reductions.
//!
//! Runs inside a study share no mutable state and are executed fork-join on
//! the rayon pool; results always come back in input order.

use crate::error::{AppError, AppResult};
use cl_controls::{
    DerivativeMode, DesignTarget, IntegrationRule, OutputLimits, PIDGains, PoleTuner, PoleTuning,
    closed_loop_coefficients,
};
use cl_ident::{
    ExcitationConfig, Identification, IdentificationData, IdentifyOptions, generate_dataset,
    identify,
};
use cl_sim::{
    ControlMode, LoopMetrics, PlantParameters, Scenario, SimOptions, Trajectory, run_sim,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A scenario with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    pub scenario: Scenario,
}

/// A design target with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTarget {
    pub name: String,
    #[serde(flatten)]
    pub target: DesignTarget,
}

/// Gains with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedGains {
    pub name: String,
    #[serde(flatten)]
    pub gains: PIDGains,
}

/// Same time grid, several loops side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStudy {
    #[serde(default)]
    pub sim: SimOptions,
    pub runs: Vec<NamedScenario>,
}

/// Pole-placement designs for one plant, each verified by simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningStudy {
    #[serde(default)]
    pub sim: SimOptions,
    pub plant: PlantParameters,
    pub reference: f64,
    #[serde(default)]
    pub ambient: f64,
    #[serde(default)]
    pub initial: f64,
    #[serde(default)]
    pub limits: OutputLimits,
    #[serde(default)]
    pub derivative: DerivativeMode,
    #[serde(default)]
    pub integration: IntegrationRule,
    pub targets: Vec<NamedTarget>,
}

/// Excite a known plant, identify it back, design PI gains on the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationStudy {
    #[serde(default)]
    pub sim: SimOptions,
    pub plant: PlantParameters,
    #[serde(default)]
    pub excitation: ExcitationConfig,
    #[serde(default)]
    pub options: IdentifyOptions,
    #[serde(default)]
    pub targets: Vec<NamedTarget>,
}

/// Any study a study file can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Study {
    Comparison(ComparisonStudy),
    Tuning(TuningStudy),
    Identification(IdentificationStudy),
}

impl Study {
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Study::Comparison(study) => {
                study.sim.sample_count()?;
                if study.runs.is_empty() {
                    return Err(AppError::Validation(
                        "comparison study has no runs".to_string(),
                    ));
                }
                for run in &study.runs {
                    run.scenario
                        .validate()
                        .map_err(|e| AppError::Validation(format!("run '{}': {e}", run.name)))?;
                }
            }
            Study::Tuning(study) => {
                study.sim.sample_count()?;
                study.plant.validate()?;
                study.limits.validate()?;
                if study.targets.is_empty() {
                    return Err(AppError::Validation(
                        "tuning study has no targets".to_string(),
                    ));
                }
                validate_targets(&study.targets)?;
            }
            Study::Identification(study) => {
                study.sim.sample_count()?;
                study.plant.validate()?;
                study.excitation.validate()?;
                study.options.validate()?;
                validate_targets(&study.targets)?;
            }
        }
        Ok(())
    }
}

fn validate_targets(targets: &[NamedTarget]) -> AppResult<()> {
    for t in targets {
        t.target
            .validate()
            .map_err(|e| AppError::Validation(format!("target '{}': {e}", t.name)))?;
    }
    Ok(())
}

/// One simulated loop and its metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub name: String,
    pub mode: ControlMode,
    pub metrics: LoopMetrics,
    pub trajectory: Trajectory,
}

/// A pole-placement design and its verification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningOutcome {
    pub name: String,
    pub tuning: PoleTuning,
    /// `[τ², 2ζτ + K·Kd, 1 + K·Kp, K·Ki]` with the final gains
    pub closed_loop: [f64; 4],
    pub run: RunOutcome,
}

/// Generated data, the identified model and the PI designs based on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationOutcome {
    pub data: IdentificationData,
    pub identification: Identification,
    pub designs: Vec<NamedGains>,
}

/// Result of [`run_study`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyOutcome {
    Comparison(Vec<RunOutcome>),
    Tuning(Vec<TuningOutcome>),
    Identification(Box<IdentificationOutcome>),
}

/// Validate and run any study.
pub fn run_study(study: &Study) -> AppResult<StudyOutcome> {
    study.validate()?;
    let outcome = match study {
        Study::Comparison(s) => StudyOutcome::Comparison(run_comparison(s)?),
        Study::Tuning(s) => StudyOutcome::Tuning(run_tuning(s)?),
        Study::Identification(s) => StudyOutcome::Identification(Box::new(run_identification(s)?)),
    };
    Ok(outcome)
}

fn simulate_named(name: &str, scenario: &Scenario, sim: &SimOptions) -> AppResult<RunOutcome> {
    let trajectory = run_sim(scenario, sim)?;
    let metrics = LoopMetrics::from_trajectory(&trajectory)
        .ok_or_else(|| AppError::Simulation(format!("run '{name}' produced no samples")))?;
    Ok(RunOutcome {
        name: name.to_string(),
        mode: scenario.mode,
        metrics,
        trajectory,
    })
}

/// Simulate every run of a comparison study.
pub fn run_comparison(study: &ComparisonStudy) -> AppResult<Vec<RunOutcome>> {
    info!(runs = study.runs.len(), "running comparison study");
    study
        .runs
        .par_iter()
        .map(|run| simulate_named(&run.name, &run.scenario, &study.sim))
        .collect()
}

/// Tune, then simulate, every target of a tuning study.
pub fn run_tuning(study: &TuningStudy) -> AppResult<Vec<TuningOutcome>> {
    info!(targets = study.targets.len(), "running tuning study");
    let tuner = PoleTuner::new();
    study
        .targets
        .par_iter()
        .map(|named| {
            let tuning = tuner.tune(&study.plant, &named.target)?;
            let scenario = Scenario::new(study.plant, study.reference)
                .with_ambient(study.ambient)
                .with_initial(study.initial)
                .with_limits(study.limits)
                .with_mode(ControlMode::Pid {
                    gains: tuning.gains,
                    derivative: study.derivative,
                    integration: study.integration,
                });
            let run = simulate_named(&named.name, &scenario, &study.sim)?;
            Ok(TuningOutcome {
                name: named.name.clone(),
                closed_loop: closed_loop_coefficients(&study.plant, &tuning.gains),
                tuning,
                run,
            })
        })
        .collect()
}

/// Generate data, identify, and design PI gains for each target.
pub fn run_identification(study: &IdentificationStudy) -> AppResult<IdentificationOutcome> {
    info!(seed = study.excitation.seed, "running identification study");
    let data = generate_dataset(&study.plant, &study.sim, &study.excitation)?;
    let identification = identify(&data.input, &data.measured_output, data.dt, &study.options)?;

    let designs = match &identification.continuous {
        Some(model) => {
            let tuner = PoleTuner::new();
            study
                .targets
                .iter()
                .map(|named| {
                    let gains =
                        tuner.tune_identified_pi(model.gain, model.time_constant, &named.target)?;
                    Ok(NamedGains {
                        name: named.name.clone(),
                        gains,
                    })
                })
                .collect::<AppResult<Vec<_>>>()?
        }
        None => Vec::new(),
    };

    Ok(IdentificationOutcome {
        data,
        identification,
        designs,
    })
}
