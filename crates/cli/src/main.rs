mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use judgesim_compute::{Scheduler, SimulationReport};
use judgesim_core::config::{load_dotenv, Config};
use judgesim_workload::DataManager;

use crate::cli::{shape_of, CliArgs, Command, GenerateArgs, SimulateArgs};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let mut config = args.load_config().context("failed to load configuration")?;

    match args.command {
        Command::Generate(args) => generate(&mut config, args),
        Command::Simulate(args) => simulate(&mut config, args),
    }
}

fn generate(config: &mut Config, args: GenerateArgs) -> Result<()> {
    args.shape.apply(config);
    if let Some(suits) = args.suits {
        config.workload.suits = suits;
    }
    config.log_summary();

    let shape = shape_of(config);
    let mut manager = DataManager::new(&config.storage.data_dir, config.workload.seed);
    let datasets = manager
        .gen(shape, config.workload.suits, true)
        .with_context(|| format!("failed to generate suites in {}", config.storage.data_dir.display()))?;

    info!(
        suits = datasets.len(),
        dir = %manager.suite_dir(shape).display(),
        "Generated dataset suites"
    );
    Ok(())
}

fn simulate(config: &mut Config, args: SimulateArgs) -> Result<()> {
    args.apply(config);
    config.log_summary();

    let shape = shape_of(config);
    let mut manager = DataManager::new(&config.storage.data_dir, config.workload.seed);
    let dataset = manager
        .load_suite(shape, args.suit)
        .with_context(|| format!("failed to load suite {} of {:?}", args.suit, shape))?;
    let (containers, tasks) = dataset
        .into_parts()
        .context("dataset references are inconsistent")?;

    let scheduler = Scheduler::new(config.scheduler.clone(), containers)
        .context("failed to create scheduler")?;
    let handle = scheduler.run(tasks).context("failed to start simulation")?;
    handle.join().context("simulation worker failed")?;

    let report = SimulationReport::from_containers(scheduler.containers());
    if args.json {
        let output = serde_json::json!({
            "config": config.summary(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        report.log_summary();
    }
    Ok(())
}
