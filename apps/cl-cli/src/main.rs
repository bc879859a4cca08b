use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use cl_app::{
    AppError, AppResult, IdentificationOutcome, RunOutcome, StudyOutcome, TuningOutcome, presets,
    run_study, to_json,
};
use cl_controls::{
    DerivativeMode, DesignTarget, IntegrationRule, OutputLimits, PIDGains, PoleTuner,
    closed_loop_coefficients,
};
use cl_core::Pole;
use cl_sim::{ControlMode, LoopMetrics, PlantParameters, Scenario, SimOptions, run_sim};
use tracing::info;

#[derive(Parser)]
#[command(name = "cl-cli")]
#[command(about = "closedloop CLI - PID loop simulation, pole-placement tuning and ARX identification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct PlantArgs {
    /// Static gain K
    #[arg(long, default_value_t = 1.0)]
    gain: f64,
    /// Time constant τ in seconds
    #[arg(long, default_value_t = 1.0)]
    tau: f64,
    /// Damping ratio ζ
    #[arg(long, default_value_t = 0.5)]
    zeta: f64,
}

impl PlantArgs {
    fn plant(&self) -> AppResult<PlantParameters> {
        Ok(PlantParameters::new(self.gain, self.tau, self.zeta)?)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Constant input, no feedback
    Open,
    /// Proportional only
    P,
    /// Full PID
    Pid,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single loop
    Simulate {
        #[command(flatten)]
        plant: PlantArgs,
        /// Setpoint
        #[arg(long, default_value_t = 22.0)]
        reference: f64,
        /// Output the plant settles to with zero input
        #[arg(long, default_value_t = 15.0)]
        ambient: f64,
        /// Initial output (defaults to the ambient value)
        #[arg(long)]
        initial: Option<f64>,
        /// Lower actuator limit
        #[arg(long)]
        out_min: Option<f64>,
        /// Upper actuator limit
        #[arg(long)]
        out_max: Option<f64>,
        #[arg(long, value_enum, default_value_t = ModeArg::Pid)]
        mode: ModeArg,
        /// Open-loop input (defaults to twice the setpoint offset)
        #[arg(long)]
        input: Option<f64>,
        #[arg(long, default_value_t = 1.5)]
        kp: f64,
        #[arg(long, default_value_t = 1.0)]
        ki: f64,
        #[arg(long, default_value_t = 0.0)]
        kd: f64,
        /// Smoothed derivative on the measurement instead of the error
        #[arg(long)]
        filtered: bool,
        /// Rectangular instead of trapezoidal integration
        #[arg(long)]
        rectangular: bool,
        /// Time step in seconds
        #[arg(long, default_value_t = 0.01)]
        dt: f64,
        /// Simulated horizon in seconds
        #[arg(long, default_value_t = 20.0)]
        t_sim: f64,
        /// Write time, output, control and error to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a built-in study (thermal, tuning, no-overshoot, elevator, identification)
    Compare {
        #[arg(default_value = "thermal")]
        preset: String,
        #[arg(long)]
        json: bool,
    },
    /// Pole-placement PID gains for a plant
    Tune {
        #[command(flatten)]
        plant: PlantArgs,
        /// Desired damping ratio
        #[arg(long, default_value_t = 1.0)]
        target_zeta: f64,
        /// Desired natural frequency in rad/s
        #[arg(long, default_value_t = 0.6)]
        wn: f64,
        #[arg(long)]
        json: bool,
    },
    /// Identify the reference plant from generated multisine data
    Identify {
        /// Noise seed
        #[arg(long)]
        seed: Option<u64>,
        /// Fraction of the record held out for validation
        #[arg(long, default_value_t = 0.0)]
        holdout: f64,
        /// Record length in seconds
        #[arg(long)]
        t_sim: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Run a study file
    Run {
        /// Path to the study YAML file
        study_path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List built-in studies
    Presets,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            plant,
            reference,
            ambient,
            initial,
            out_min,
            out_max,
            mode,
            input,
            kp,
            ki,
            kd,
            filtered,
            rectangular,
            dt,
            t_sim,
            csv,
            json,
        } => {
            let gains = PIDGains { kp, ki, kd };
            let mode = match mode {
                ModeArg::Open => ControlMode::OpenLoop {
                    input: input.unwrap_or((reference - ambient) * 2.0),
                },
                ModeArg::P => ControlMode::Proportional { kp },
                ModeArg::Pid => ControlMode::Pid {
                    gains,
                    derivative: if filtered {
                        DerivativeMode::filtered_measurement()
                    } else {
                        DerivativeMode::OnError
                    },
                    integration: if rectangular {
                        IntegrationRule::Rectangular
                    } else {
                        IntegrationRule::Trapezoidal
                    },
                },
            };
            let limits = OutputLimits::new(
                out_min.unwrap_or(f64::NEG_INFINITY),
                out_max.unwrap_or(f64::INFINITY),
            )?;
            let scenario = Scenario::new(plant.plant()?, reference)
                .with_ambient(ambient)
                .with_initial(initial.unwrap_or(ambient))
                .with_limits(limits)
                .with_mode(mode);
            let sim = SimOptions::new(dt, t_sim)?;
            cmd_simulate(&scenario, &sim, csv.as_deref(), json)
        }
        Commands::Compare { preset, json } => {
            let study = presets::by_name(&preset)?;
            print_study(&run_study(&study)?, json)
        }
        Commands::Tune {
            plant,
            target_zeta,
            wn,
            json,
        } => cmd_tune(&plant.plant()?, &DesignTarget::new(target_zeta, wn)?, json),
        Commands::Identify {
            seed,
            holdout,
            t_sim,
            json,
        } => {
            let mut study = presets::identification();
            if let Some(seed) = seed {
                study.excitation.seed = seed;
            }
            if let Some(t_sim) = t_sim {
                study.sim = SimOptions::new(study.sim.dt, t_sim)?;
            }
            study.options.holdout_fraction = holdout;
            print_study(&run_study(&cl_app::Study::Identification(study))?, json)
        }
        Commands::Run { study_path, json } => {
            let file = cl_app::load_yaml(&study_path)?;
            info!(name = %file.name, "loaded study file");
            if !json {
                println!("Study: {}", file.name);
                if let Some(description) = &file.description {
                    println!("  {}", description);
                }
            }
            print_study(&run_study(&file.study)?, json)
        }
        Commands::Presets => {
            println!("Built-in studies:");
            for name in presets::PRESET_NAMES {
                println!("  {}", name);
            }
            Ok(())
        }
    }
}

fn cmd_simulate(
    scenario: &Scenario,
    sim: &SimOptions,
    csv_path: Option<&Path>,
    json: bool,
) -> AppResult<()> {
    let trajectory = run_sim(scenario, sim)?;
    let metrics = LoopMetrics::from_trajectory(&trajectory)
        .ok_or_else(|| AppError::Simulation("empty trajectory".to_string()))?;

    if let Some(path) = csv_path {
        let mut csv = String::from("time_s,output,control,error\n");
        let samples = trajectory
            .time()
            .iter()
            .zip(trajectory.output())
            .zip(trajectory.control())
            .zip(trajectory.error());
        for (((t, y), u), e) in samples {
            csv.push_str(&format!("{},{},{},{}\n", t, y, u, e));
        }
        std::fs::write(path, csv)?;
        if !json {
            println!(
                "✓ Exported {} samples to {}",
                trajectory.len(),
                path.display()
            );
        }
    }

    let run = RunOutcome {
        name: scenario.mode.label().to_string(),
        mode: scenario.mode,
        metrics,
        trajectory,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_runs(std::slice::from_ref(&run));
    }
    Ok(())
}

fn cmd_tune(plant: &PlantParameters, target: &DesignTarget, json: bool) -> AppResult<()> {
    let tuning = PoleTuner::new().tune(plant, target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tuning)?);
        return Ok(());
    }

    println!(
        "Plant: K = {}, τ = {} s, ζ = {}",
        plant.gain, plant.time_constant, plant.damping
    );
    println!("  Open-loop poles: {}", format_poles(&plant.poles()));
    println!(
        "Target: ζ_d = {}, ω_n = {} rad/s ({:?})",
        target.damping,
        target.natural_frequency,
        target.regime()
    );
    println!("  Desired poles: {}", format_poles(&tuning.dominant_poles));
    println!("  Extra pole: {:.4}", -tuning.extra_pole);
    let [a2, a1, a0] = tuning.desired_polynomial;
    println!("  Desired polynomial: s³ + {a2:.4}s² + {a1:.4}s + {a0:.4}");
    print_gains("Analytic gains", &tuning.analytic_gains);
    print_gains("Final gains", &tuning.gains);
    if tuning.any_floored() {
        println!("  (minimum gains applied)");
    }
    let [c3, c2, c1, c0] = closed_loop_coefficients(plant, &tuning.gains);
    println!("  Closed loop: {c3:.4}s³ + {c2:.4}s² + {c1:.4}s + {c0:.4}");
    Ok(())
}

fn print_study(outcome: &StudyOutcome, json: bool) -> AppResult<()> {
    if json {
        println!("{}", to_json(outcome)?);
        return Ok(());
    }
    match outcome {
        StudyOutcome::Comparison(runs) => print_runs(runs),
        StudyOutcome::Tuning(designs) => print_tunings(designs),
        StudyOutcome::Identification(outcome) => print_identification(outcome),
    }
    Ok(())
}

fn print_runs(runs: &[RunOutcome]) {
    println!(
        "{:<24} {:>8} {:>10} {:>10} {:>9} {:>8} {:>10} {:>10}",
        "Run", "Mode", "ISE", "t_s [s]", "OS [%]", "ζ_obs", "e_ss", "|u|max"
    );
    for run in runs {
        let m = &run.metrics;
        println!(
            "{:<24} {:>8} {:>10.3} {:>10.2} {:>9.2} {:>8.3} {:>10.4} {:>10.2}",
            run.name,
            run.mode.label(),
            m.ise,
            m.settling_time_s,
            m.overshoot_pct,
            m.observed_damping,
            m.steady_state_error,
            m.peak_control
        );
    }
}

fn print_tunings(designs: &[TuningOutcome]) {
    for design in designs {
        println!(
            "{}: ζ_d = {}, ω_n = {}",
            design.name, design.tuning.target.damping, design.tuning.target.natural_frequency
        );
        print_gains("Gains", &design.tuning.gains);
    }
    let runs: Vec<RunOutcome> = designs.iter().map(|d| d.run.clone()).collect();
    print_runs(&runs);
}

fn print_identification(outcome: &IdentificationOutcome) {
    let id = &outcome.identification;
    println!(
        "ARX({}, {}, {}) fitted on {} samples",
        id.model.orders.na, id.model.orders.nb, id.model.orders.nk, id.fit_samples
    );
    println!("  a = {:?}", id.model.a);
    println!("  b = {:?}", id.model.b);
    println!(
        "Validation from sample {}: R² = {:.4}, RMSE = {:.4}, fit = {:.1} %",
        id.validation_start, id.metrics.r_squared, id.metrics.rmse, id.metrics.fit_percent
    );
    match &id.continuous {
        Some(model) => {
            println!(
                "Continuous model: K = {:.4}, τ = {:.4}, ζ = {:.4}",
                model.gain, model.time_constant, model.damping
            );
            for design in &outcome.designs {
                print_gains(&design.name, &design.gains);
            }
        }
        None => println!("No continuous model for this structure"),
    }
}

fn print_gains(label: &str, gains: &PIDGains) {
    println!(
        "  {}: Kp = {:.4}, Ki = {:.4}, Kd = {:.4}",
        label, gains.kp, gains.ki, gains.kd
    );
}

fn format_poles(poles: &[Pole; 2]) -> String {
    poles
        .iter()
        .map(|p| {
            if p.is_real() {
                format!("{:.4}", p.re)
            } else {
                format!("{:.4} {:+.4}j", p.re, p.im)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
