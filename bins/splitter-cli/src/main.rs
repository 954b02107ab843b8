//! splitter: previews and scenario replays for weighted revenue splits.
//!
//! `simulate` prints the per-membership split of an amount under a
//! configuration; `replay` drives a pull ledger or push distributor over an
//! in-memory bank and prints every step as a JSON line.

mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use splitter_core::bank::MemoryBank;
use splitter_core::math::dust;
use splitter_core::traits::MembershipRegistry;
use splitter_core::types::{payout_total, Amount, Payout};
use splitter_ledger::{Distribution, DistributionMode, SplitConfig, Splitter};

use crate::scenario::{Replay, Scenario};

/// Weighted proportional revenue splits.
#[derive(Parser)]
#[command(name = "splitter", version, about = "Weighted proportional revenue splits")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Defaults to the config's `log_level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how an amount would be split among the configured members.
    Simulate(SimulateArgs),
    /// Replay a scenario file against an in-memory bank.
    Replay(ReplayArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Configuration file (TOML or JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Amount to split, in base units.
    #[arg(short, long)]
    amount: Amount,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// Scenario file (JSON).
    #[arg(short, long)]
    scenario: PathBuf,

    /// Exit with an error if any step failed.
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct SimulateOutput<'a> {
    mode: DistributionMode,
    amount: Amount,
    distributed: Amount,
    dust: Amount,
    payouts: &'a [Payout],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(ref args) => simulate(&cli, args),
        Commands::Replay(ref args) => replay(&cli, args),
    }
}

fn simulate(cli: &Cli, args: &SimulateArgs) -> Result<()> {
    let config = SplitConfig::load(&args.config)
        .with_context(|| format!("failed to load config: {}", args.config.display()))?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level), &cli.log_format);

    let splitter = Splitter::from_config(&config, MemoryBank::new()).context("invalid splitter configuration")?;
    let payouts = splitter.simulate_split(args.amount)?;
    let amounts: Vec<Amount> = payouts.iter().map(|p| p.amount).collect();
    let output = SimulateOutput {
        mode: splitter.mode(),
        amount: args.amount,
        distributed: payout_total(&payouts),
        dust: dust(args.amount, &amounts),
        payouts: &payouts,
    };
    info!(amount = output.amount, members = payouts.len(), "simulate: split computed");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let members = splitter.members();
    println!("mode: {:?}  asset: {}", output.mode, splitter.asset());
    println!("{:>4}  {:<42}  {:>10}  {:>40}", "id", "owner", "weight", "amount");
    for p in &payouts {
        println!(
            "{:>4}  {:<42}  {:>10}  {:>40}",
            p.id.0,
            p.owner.to_string(),
            members.weight_of(p.id)?,
            p.amount
        );
    }
    println!("distributed: {}  dust: {}", output.distributed, output.dust);
    Ok(())
}

fn replay(cli: &Cli, args: &ReplayArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    init_logging(
        cli.log_level.as_deref().unwrap_or(&scenario.config.log_level),
        &cli.log_format,
    );

    let mut replay = Replay::new(&scenario.config)?;
    let mut outcomes = vec![replay.setup()];
    outcomes.extend(replay.run_all(&scenario.steps));
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(steps = scenario.steps.len(), failed, "replay: finished");
    if args.strict && failed > 0 {
        bail!("{failed} of {} steps failed", scenario.steps.len());
    }
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides `level_str`.
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
