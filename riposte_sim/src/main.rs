//! Headless batch runner
//!
//! Plays N seeded sessions in statistical mode and writes one JSON
//! `RunSummary` per line to stdout for offline balance analysis.

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riposte_core::config::AugmentTable;
use riposte_core::prelude::*;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Batch runner for statistical-mode combat sessions
#[derive(Parser, Debug)]
#[command(name = "riposte_sim")]
#[command(about = "Run seeded auto-play sessions and print one JSON summary per run")]
struct Args {
    /// Number of sessions to play
    #[arg(long, default_value_t = 100)]
    runs: u32,

    /// Master seed; every run derives its own seed from it
    #[arg(long)]
    seed: Option<u64>,

    /// Stop a run after this many encounters are won
    #[arg(long, default_value_t = 50)]
    max_rounds: u32,

    /// Balance constants (TOML or JSON); built-in defaults when omitted
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Wave table (TOML or JSON)
    #[arg(long)]
    waves: Option<PathBuf>,

    /// Augment table (TOML or JSON)
    #[arg(long)]
    augments: Option<PathBuf>,

    /// Pretty-print each summary instead of one line per run
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct RunLine<'a> {
    run: u32,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riposte_sim=info,riposte_core=warn".into()),
        )
        .init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let constants = match &args.balance {
        Some(path) => BalanceConstants::load(path)
            .with_context(|| format!("loading balance constants from {}", path.display()))?,
        None => BalanceConstants::default(),
    };
    let waves = match &args.waves {
        Some(path) => WaveTable::load(path)
            .with_context(|| format!("loading wave table from {}", path.display()))?,
        None => default_waves().context("parsing built-in wave table")?,
    };
    waves
        .validate_for(ResolutionMode::Statistical)
        .context("wave table cannot be played in statistical mode")?;
    let augments = match &args.augments {
        Some(path) => AugmentTable::load(path)
            .with_context(|| format!("loading augment table from {}", path.display()))?,
        None => default_augments().context("parsing built-in augment table")?,
    };

    let constants = Arc::new(constants);
    let waves = Arc::new(waves);
    let registry = Arc::new(ModifierRegistry::new(augments)?);

    let master_seed = args.seed.unwrap_or_else(rand::random);
    let mut seeder = ChaCha8Rng::seed_from_u64(master_seed);
    tracing::info!(runs = args.runs, master_seed, max_rounds = args.max_rounds, "starting batch");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut total_rounds: u64 = 0;
    let mut deaths: u32 = 0;

    for run in 0..args.runs {
        let seed: u64 = seeder.gen();
        let mut session = Session::new(
            Arc::clone(&constants),
            Arc::clone(&waves),
            Arc::clone(&registry),
            ResolutionMode::Statistical,
            seed,
        );
        let summary = session.run_to_end(args.max_rounds);
        total_rounds += u64::from(summary.rounds_cleared);
        if summary.game_over {
            deaths += 1;
        }

        let line = RunLine {
            run,
            summary: &summary,
        };
        if args.pretty {
            serde_json::to_writer_pretty(&mut out, &line)?;
        } else {
            serde_json::to_writer(&mut out, &line)?;
        }
        writeln!(out)?;
        tracing::debug!(run, seed, rounds = summary.rounds_cleared, "run finished");
    }
    out.flush()?;

    if args.runs > 0 {
        tracing::info!(
            runs = args.runs,
            deaths,
            mean_rounds = total_rounds as f64 / f64::from(args.runs),
            "batch complete"
        );
    }
    Ok(())
}
