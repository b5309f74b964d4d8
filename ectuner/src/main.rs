//! ectuner CLI

use anyhow::{Context, Result};
use clap::Parser;
use ectuner::io::{self, Overrides, TunerConfig};
use ectuner::tuning::{BiasModel, FluxOffset, Tuner, TuningProblem, TuningReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ectuner")]
#[command(about = "EC-Earth tuning tool")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = "config-tuner.yaml")]
    config: PathBuf,

    /// Output YAML with the tuned parameters, grouped for the run scripts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "INFO")]
    loglevel: tracing::Level,

    /// Maximum number of minimizer iterations
    #[arg(short, long)]
    maxiter: Option<usize>,

    /// Penalty for relative parameter changes
    #[arg(short, long)]
    penalty: Option<f64>,

    /// Fractional maximum parameter change
    #[arg(short, long)]
    inc: Option<f64>,

    /// Experiment to tune
    exp: String,

    /// Start year
    year1: Option<i32>,

    /// End year
    year2: Option<i32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.loglevel).with_target(false).init();

    let config = TunerConfig::from_path(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;
    let overrides = Overrides {
        year1: cli.year1,
        year2: cli.year2,
        penalty: cli.penalty,
        inc: cli.inc,
        maxiter: cli.maxiter,
    };
    let settings = config.resolve(&cli.exp, &overrides)?;
    tracing::debug!(
        exp = %settings.exp,
        year1 = settings.year1,
        year2 = settings.year2,
        penalty = settings.options.penalty,
        inc = settings.options.increment,
        maxiter = settings.options.solver.max_iterations,
        "run settings"
    );

    let paths = &settings.paths;
    let sensitivity = io::load_sensitivity(&paths.sensitivity).context("loading sensitivities")?;
    let reference = io::load_reference(&paths.reference).context("loading reference")?;
    let base = io::load_base(&paths.base).context("loading simulated global means")?;
    let current = io::load_parameters(&paths.params).context("loading parameters")?;

    let bias = BiasModel::compute(&base, &reference);
    let problem = TuningProblem::build(
        &current,
        &config.reference_parameters,
        &sensitivity,
        &bias,
        &config.weights(),
        &settings.options,
    )?;
    for p in problem.parameters() {
        tracing::debug!(parameter = %p.name, max_change = p.max_change, "bound");
    }

    let zero = problem.initial_changes();
    tracing::info!("Target offset before optimization:");
    log_offsets(&problem.objective().offsets(&zero));
    tracing::info!("Optimizing parameters ...");

    let outcome = Tuner::new(settings.options.solver.clone()).optimize(&problem)?;
    let report = TuningReport::new(&problem, &outcome)?;

    tracing::info!("Target offset after optimization:");
    log_offsets(&report.offsets_after);
    tracing::info!("Total score before optimization: {}", report.initial_score);
    tracing::info!("Total score after optimization: {}", report.final_score);

    if let Some(output) = &cli.output {
        let grouped = report.grouped(&config.parameter_group)?;
        io::write_tuning(output, &grouped)
            .with_context(|| format!("writing {}", output.display()))?;
    }

    println!("\nParameters:");
    println!("-----------");
    for row in &report.parameters {
        println!("{} : {}", row.name, io::format_real(row.new_value));
    }
    println!();
    print!("{}", io::render_parameter_table(&report.parameters));

    Ok(())
}

fn log_offsets(offsets: &[FluxOffset]) {
    for o in offsets {
        tracing::info!("{} {}", o.key, o.offset);
    }
}
