//! RateMesh Simulator
//!
//! Replays rate scenarios against the conversion service and load-tests the
//! incremental graph with concurrent writers and readers.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod metrics;
mod scenario;

use controller::{LoadConfig, SimulationController};
use scenario::Scenario;

/// RateMesh Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "RateMesh scenario replay and load simulation")]
struct Args {
    /// Scenario to run: reference, republish or concurrent
    #[arg(short, long, default_value = "reference")]
    scenario: String,

    /// Replay a scenario from a JSON file instead of a built-in one
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// Number of currencies in the concurrent scenario
    #[arg(short, long, default_value = "32")]
    currencies: usize,

    /// Writer threads (and as many readers) in the concurrent scenario
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Compare every pair against the brute-force baseline
    #[arg(long)]
    verify: bool,

    /// Print the selected built-in scenario as JSON and exit
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting RateMesh Simulator");

    let mut controller = SimulationController::new(args.seed);

    if let Some(path) = &args.scenario_file {
        let json = std::fs::read_to_string(path)?;
        let scenario = Scenario::from_json(&json)?;
        controller.run_scenario(&scenario)?;
    } else if args.scenario == "concurrent" {
        let load = LoadConfig {
            currencies: args.currencies,
            threads: args.threads,
            verify: args.verify,
        };
        controller.run_concurrent(&load).await?;
    } else {
        let scenario = Scenario::load(&args.scenario)?;
        if args.dump {
            println!("{}", serde_json::to_string_pretty(&scenario)?);
            return Ok(());
        }
        controller.run_scenario(&scenario)?;
    }

    let metrics = controller.get_metrics();
    info!("Simulation complete");
    info!("Publishes: {}", metrics.publishes);
    info!("Conversions: {}", metrics.conversions);
    info!("Not found: {}", metrics.failures);
    info!("Mismatches: {}", metrics.mismatches);
    info!("Average latency: {}us", metrics.average_latency_us());
    info!("p99 latency: {}us", metrics.p99_latency_us());

    if metrics.mismatches > 0 {
        anyhow::bail!("{} results did not match expectations", metrics.mismatches);
    }

    Ok(())
}
