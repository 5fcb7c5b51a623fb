#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs CeloRiders headlessly.

mod config;
mod simulation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use celo_riders_core::GAME_TITLE;
use celo_riders_system_waves::{WaveAnnouncement, WaveTable};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{config::ScenarioConfig, simulation::Simulation};

#[derive(Parser, Debug)]
#[command(name = "celo-riders", about = "Headless CeloRiders runs", version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Play one seeded run with a scripted rider and print its summary.
    Simulate(SimulateArgs),
    /// Print the wave unlock table.
    Waves {
        /// Scenario file whose wave table should be listed.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Scenario file; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the scenario's seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_scenario(path: Option<&PathBuf>) -> Result<ScenarioConfig> {
    match path {
        Some(path) => ScenarioConfig::load(path),
        None => Ok(ScenarioConfig::default()),
    }
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let mut scenario = load_scenario(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    let summary = Simulation::new(scenario).run()?;
    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        println!("{GAME_TITLE} run (seed {})", summary.seed);
        println!("  rider:     {}", summary.character.as_str());
        println!("  score:     {}", summary.final_score);
        println!("  stars:     {}", summary.stars);
        println!("  wave:      {}", summary.final_wave);
        println!("  victory:   {}", summary.victory);
        println!("  duration:  {:.2}s", summary.duration_secs);
        println!(
            "  combos:    {} (best bonus {})",
            summary.combos_completed, summary.best_combo_bonus
        );
    }
    Ok(())
}

fn list_waves(config: Option<&PathBuf>) -> Result<()> {
    let table: WaveTable = load_scenario(config)?.waves.unwrap_or_default();
    for (wave, unlocks) in table.iter() {
        let announcement = WaveAnnouncement::for_wave(wave);
        println!(
            "{} ({} challenges)",
            announcement.banner, unlocks.total_challenges
        );
        println!("  obstacles: {}", join(unlocks.obstacles.iter().map(|kind| kind.as_str())));
        println!("  power-ups: {}", join(unlocks.power_ups.iter().map(|kind| kind.as_str())));
        println!("  enemies:   {}", join(unlocks.enemies.iter().map(|kind| kind.as_str())));
    }
    Ok(())
}

fn join<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let ids: Vec<&str> = ids.collect();
    if ids.is_empty() {
        "-".to_owned()
    } else {
        ids.join(", ")
    }
}

/// Entry point for the CeloRiders command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.action {
        Action::Simulate(args) => simulate(args),
        Action::Waves { config } => list_waves(config.as_ref()),
    }
}
