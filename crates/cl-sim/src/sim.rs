//! Simulation engine.

use crate::error::{SimError, SimResult};
use crate::plant::{DiscretePlant, PlantParameters};
use crate::trajectory::Trajectory;
use cl_controls::{DerivativeMode, IntegrationRule, OutputLimits, PIDController, PIDGains};
use cl_core::{ensure_finite, sample_count};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the plant input is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMode {
    /// Constant input, no feedback.
    OpenLoop { input: f64 },
    /// `u = Kp · e`.
    Proportional { kp: f64 },
    /// Full PID law.
    Pid {
        gains: PIDGains,
        #[serde(default)]
        derivative: DerivativeMode,
        #[serde(default)]
        integration: IntegrationRule,
    },
}

impl ControlMode {
    /// PID with derivative-on-error and trapezoidal integration.
    pub fn pid(gains: PIDGains) -> Self {
        Self::Pid {
            gains,
            derivative: DerivativeMode::default(),
            integration: IntegrationRule::default(),
        }
    }

    pub fn is_closed_loop(&self) -> bool {
        !matches!(self, Self::OpenLoop { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenLoop { .. } => "open-loop",
            Self::Proportional { .. } => "P",
            Self::Pid { .. } => "PID",
        }
    }
}

/// Everything needed to run one loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub plant: PlantParameters,
    /// Setpoint.
    pub reference: f64,
    /// Bias the plant settles to with zero input (e.g. ambient temperature).
    #[serde(default)]
    pub ambient: f64,
    /// Output at k = 0 and k = 1.
    #[serde(default)]
    pub initial: f64,
    #[serde(default)]
    pub limits: OutputLimits,
    pub mode: ControlMode,
}

impl Scenario {
    /// Open-loop scenario with zero input, zero bias and no saturation.
    pub fn new(plant: PlantParameters, reference: f64) -> Self {
        Self {
            plant,
            reference,
            ambient: 0.0,
            initial: 0.0,
            limits: OutputLimits::unbounded(),
            mode: ControlMode::OpenLoop { input: 0.0 },
        }
    }

    pub fn with_ambient(mut self, ambient: f64) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_initial(mut self, initial: f64) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_limits(mut self, limits: OutputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_mode(mut self, mode: ControlMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        self.plant.validate()?;
        self.limits.validate()?;
        ensure_finite(self.reference, "reference")?;
        ensure_finite(self.ambient, "ambient")?;
        ensure_finite(self.initial, "initial condition")?;
        if let ControlMode::OpenLoop { input } = self.mode {
            ensure_finite(input, "open-loop input")?;
        }
        Ok(())
    }
}

/// Options for simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Simulated horizon (seconds)
    pub t_sim: f64,
}

impl SimOptions {
    pub fn new(dt: f64, t_sim: f64) -> SimResult<Self> {
        let opts = Self { dt, t_sim };
        opts.sample_count()?;
        Ok(opts)
    }

    /// `N = ⌈t_sim/dt⌉ + 1`.
    pub fn sample_count(&self) -> SimResult<usize> {
        sample_count(self.t_sim, self.dt).map_err(|_| SimError::InvalidParameter {
            what: "dt and t_sim must be positive",
        })
    }
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.01,
            t_sim: 20.0,
        }
    }
}

enum ControlLaw {
    Constant(f64),
    Feedback(PIDController),
}

impl ControlLaw {
    fn build(mode: &ControlMode, limits: OutputLimits) -> SimResult<Self> {
        let law = match *mode {
            ControlMode::OpenLoop { input } => Self::Constant(limits.clamp(input)),
            ControlMode::Proportional { kp } => {
                Self::Feedback(PIDController::new(PIDGains::proportional(kp), limits)?)
            }
            ControlMode::Pid {
                gains,
                derivative,
                integration,
            } => Self::Feedback(PIDController::with_modes(
                gains,
                limits,
                derivative,
                integration,
            )?),
        };
        Ok(law)
    }
}

/// Run one scenario on a fixed grid.
///
/// Samples 0 and 1 hold the initial condition. From k = 2 on, closed-loop
/// modes act on `y[k−1]` and record `e[k] = reference − y[k−1]`; open loop
/// records `e[k] = reference − y[k]`. The control is saturated in every
/// mode.
pub fn run_sim(scenario: &Scenario, opts: &SimOptions) -> SimResult<Trajectory> {
    scenario.validate()?;
    let n = opts.sample_count()?;
    let plant = DiscretePlant::new(scenario.plant, opts.dt)?;
    let mut law = ControlLaw::build(&scenario.mode, scenario.limits)?;

    let reference = scenario.reference;
    let mut output = vec![scenario.initial; n];
    let mut control = vec![0.0; n];
    let mut error = vec![reference - scenario.initial; n];

    if let ControlLaw::Constant(u) = &law {
        control.fill(*u);
    }

    for k in 2..n {
        let u = match &mut law {
            ControlLaw::Constant(u) => *u,
            ControlLaw::Feedback(pid) => {
                error[k] = reference - output[k - 1];
                pid.step(reference, output[k - 1], opts.dt)?
            }
        };
        control[k] = u;
        output[k] = plant.step(output[k - 1], output[k - 2], u, scenario.ambient);
        if matches!(law, ControlLaw::Constant(_)) {
            error[k] = reference - output[k];
        }
    }

    debug!(
        mode = scenario.mode.label(),
        samples = n,
        final_output = output[n - 1],
        "simulation complete"
    );

    Ok(Trajectory::new(reference, opts.dt, output, control, error))
}
