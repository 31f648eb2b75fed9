use anyhow::{Context, Result};
use clap::Parser;
use crisis_simulator_core_rs::{
    BatchConfig, CompiledIntel, EngineKind, Orchestrator, Outcome, PriorsBundle,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "crisis-sim",
    version,
    about = "Monte Carlo forecaster for a 90-day political crisis"
)]
struct Cli {
    /// Compiled intel snapshot (JSON).
    #[arg(long)]
    intel: PathBuf,

    /// Resolved priors bundle (JSON).
    #[arg(long)]
    priors: PathBuf,

    /// Number of independent trajectories.
    #[arg(long, default_value_t = 10_000)]
    runs: usize,

    /// Seed base; run i is seeded from (seed, i).
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Use the agent-based engine instead of the state machine.
    #[arg(long, default_value_t = false)]
    abm: bool,

    /// Where to write the result document.
    #[arg(long, default_value = "simulation_results.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let priors_json = fs::read_to_string(&cli.priors)
        .with_context(|| format!("failed to read priors {}", cli.priors.display()))?;
    let intel_json = fs::read_to_string(&cli.intel)
        .with_context(|| format!("failed to read intel {}", cli.intel.display()))?;

    let priors = PriorsBundle::from_json_str(&priors_json)
        .with_context(|| format!("invalid priors {}", cli.priors.display()))?;
    let intel = CompiledIntel::from_json_str(&intel_json)
        .with_context(|| format!("intel {} is not valid JSON", cli.intel.display()))?;

    let config = BatchConfig {
        runs: cli.runs,
        seed: cli.seed,
        engine: if cli.abm {
            EngineKind::Abm
        } else {
            EngineKind::StateMachine
        },
        ..BatchConfig::default()
    };

    let orchestrator =
        Orchestrator::new(config, priors, intel).context("simulation setup failed")?;
    let result = orchestrator.run();

    result
        .write_atomic(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    let summary = Outcome::ALL
        .iter()
        .filter_map(|o| {
            result
                .outcome_distribution
                .get(o)
                .map(|s| format!("{}={:.3}", o.as_str(), s.probability))
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{} runs ({}) -> {}: {}",
        result.n_runs,
        orchestrator.config().engine.as_str(),
        cli.output.display(),
        summary
    );
    Ok(())
}
