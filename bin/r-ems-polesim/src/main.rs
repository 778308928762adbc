//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Command-line runner for pole wind-loading scenarios."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use r_ems_common::logging::init_tracing;
use r_ems_common::time::display_timestamp;
use r_ems_common::AppConfig;
use r_ems_logging::{log_system_event, LogContext, SystemEventOutcome};
use r_ems_sim::{Scenario, ScenarioBuild, SimulationReport};
use r_ems_structures::PoleStatus;
use tracing::info;

const DEFAULT_CONFIG: &str = "configs/polesim.toml";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "R-EMS pole wind-loading simulator",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scenario over the configured simulation window.
    Run(RunArgs),
    /// Initialise every pole in a scenario and report configuration errors.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, value_name = "FILE")]
    scenario: PathBuf,

    /// Print the full report as JSON instead of the summary table.
    #[arg(long)]
    json: bool,

    /// Halt the run as soon as any pole fails.
    #[arg(long)]
    stop_on_failure: bool,

    /// Seed for the random-order passes.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long, value_name = "FILE")]
    scenario: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing("r-ems-polesim", &config.logging)?;

    match cli.command {
        Commands::Run(args) => run(config, args),
        Commands::Check(args) => check(&config, &args),
    }
}

/// Explicit path or `R_EMS_CONFIG` first, then the default file if present, then built-in defaults.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load(&[path]);
    }
    let env_override = std::env::var(AppConfig::ENV_CONFIG_PATH)
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if env_override || Path::new(DEFAULT_CONFIG).exists() {
        return AppConfig::load(&[DEFAULT_CONFIG]);
    }
    Ok(AppConfig::default())
}

fn build(scenario_path: &Path, config: &AppConfig) -> Result<ScenarioBuild> {
    let scenario = Scenario::from_path(scenario_path)?;
    scenario
        .build(config)
        .with_context(|| format!("unable to build scenario {}", scenario_path.display()))
}

fn report_failures(build: &ScenarioBuild) {
    for failure in &build.failures {
        eprintln!("error: {failure}");
    }
}

fn check(config: &AppConfig, args: &CheckArgs) -> Result<()> {
    let build = build(&args.scenario, config)?;
    report_failures(&build);
    if !build.is_clean() {
        bail!(
            "{} of {} poles failed to initialise",
            build.failures.len(),
            build.failures.len() + build.assemblies.len()
        );
    }
    println!(
        "{}: {} poles, {} catalog objects, {} weather tapes OK",
        args.scenario.display(),
        build.assemblies.len(),
        build.catalog.len(),
        build.weather.len()
    );
    Ok(())
}

fn run(mut config: AppConfig, args: RunArgs) -> Result<()> {
    if args.stop_on_failure {
        config.structures.stop_on_pole_failure = true;
    }
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }

    let build = build(&args.scenario, &config)?;
    report_failures(&build);
    if !build.is_clean() {
        bail!("scenario has {} initialisation errors", build.failures.len());
    }
    info!(
        scenario = %args.scenario.display(),
        poles = build.assemblies.len(),
        "scenario loaded"
    );

    let mut scheduler = build.into_scheduler(&config);
    let report = scheduler.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    let scenario = args.scenario.display().to_string();
    let ctx = LogContext::new().with_object(&scenario);
    log_system_event(
        Some(&ctx),
        "polesim.run",
        "scenario run complete",
        SystemEventOutcome::Success,
    );
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    println!(
        "window {} .. {} ({} steps)",
        display_timestamp(report.start),
        display_timestamp(report.stop),
        report.steps.len()
    );
    println!(
        "{:<24} {:>8} {:>12} {:>9} {:>8}",
        "pole", "status", "max stress", "failures", "repairs"
    );
    for summary in report.summaries() {
        let status = match summary.final_status {
            PoleStatus::Ok => "OK",
            PoleStatus::Failed => "FAILED",
        };
        println!(
            "{:<24} {:>8} {:>12.4} {:>9} {:>8}",
            summary.name, status, summary.max_stress, summary.failures, summary.repairs
        );
    }
    if let Some(halt) = &report.halted {
        println!("halted at {}: {}", display_timestamp(halt.at), halt);
    }
}
