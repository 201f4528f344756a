/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use rtfeas::batch;
use rtfeas::config::EngineConfig;
use rtfeas::evaluate::{evaluate, Algorithm, EvaluationOptions, COULD_NOT_EVALUATE};
use rtfeas::multiproc::partition::{Heuristic, SortOrder};
use rtfeas::multiproc::{MultiConfig, MultiMode};
use rtfeas::parse::parse_task_set;
use rtfeas::uniproc::UniAlgorithm;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Feasibility of periodic real-time task sets.
///
/// A file argument exits with the result code:
///   0 schedulable (simulated)      1 schedulable (shortcut)
///   2 not schedulable (simulated)  3 not schedulable (shortcut)
///   4 timed out / cannot tell      5 could not parse or evaluate
///
/// A folder argument evaluates every file below it and prints a summary.
///
/// Example:
///   rtfeas uni edf tasksets/set-0001.csv
///   rtfeas multi tasksets/ 8 --version 2 -H bf -s du -w 16
#[derive(Debug, Parser)]
#[command(name = "rtfeas", about = "Real-time task-set feasibility oracle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One processor: rm, dm, audsley, edf or rr.
    Uni(UniArgs),
    /// m processors under Global, Partitioned or clustered EDF(k).
    Multi(MultiArgs),
}

#[derive(Debug, Args)]
struct UniArgs {
    /// Scheduling algorithm.
    algorithm: UniAlgorithm,

    /// Task-set file or folder of task-set files.
    path: PathBuf,

    /// Trace every simulation cycle.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct MultiArgs {
    /// Task-set file or folder of task-set files.
    path: PathBuf,

    /// Number of processors.
    m: usize,

    /// `global`, `partitioned` or a cluster count k.
    #[arg(long = "version")]
    mode: MultiMode,

    /// Partitioning heuristic, required when there is more than one cluster.
    #[arg(short = 'H', long = "heuristic")]
    heuristic: Option<Heuristic>,

    /// Order tasks by increasing (iu) or decreasing (du) utilisation.
    #[arg(short = 's', long = "sort", default_value = "du")]
    sort: SortOrder,

    /// Trace every simulation cycle.
    #[arg(short = 'V', long = "verbose", default_value_t = false)]
    verbose: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Skip analytic shortcuts and decide by simulation where possible.
    #[arg(short = 'f', long = "force-simulation", default_value_t = false)]
    force_simulation: bool,

    /// Worker count for folder evaluation (overrides the configuration file).
    #[arg(short = 'w', long = "workers")]
    workers: Option<usize>,

    /// Path to the YAML engine configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Command::Uni(args) => args.verbose,
        Command::Multi(args) => args.verbose,
    };

    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // Results go to stdout, diagnostics to stderr.
    let default_filter = if verbose { "info,rtfeas=trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli.command, verbose).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            COULD_NOT_EVALUATE
        }
    };
    process::exit(i32::from(code));
}

async fn run(command: Command, verbose: bool) -> Result<u8> {
    let (algorithm, path, common) = match command {
        Command::Uni(args) => (Algorithm::Uni(args.algorithm), args.path, args.common),
        Command::Multi(args) => {
            let config = MultiConfig::new(args.m, args.mode, args.heuristic, args.sort)
                .context("Invalid multiprocessor configuration")?;
            (Algorithm::Multi(config), args.path, args.common)
        }
    };

    let mut engine = load_engine_config(common.config.as_deref())?;
    if let Some(workers) = common.workers {
        engine.batch.workers = workers.max(1);
    }
    let options = EvaluationOptions {
        verbose,
        force_simulation: common.force_simulation,
    };

    info!(
        algorithm = %algorithm,
        path = %path.display(),
        force_simulation = options.force_simulation,
        "Configuration"
    );

    if path.is_dir() {
        let entries =
            batch::review_folder(&path, &algorithm, options, &engine.limits, &engine.batch).await?;
        let tally = batch::tally(&algorithm, &entries);
        print!("{}", tally.to_yaml().context("Cannot render batch summary")?);
        return Ok(0);
    }

    let task_set = parse_task_set(&path)?;
    let result = evaluate(&algorithm, &task_set, options, &engine.limits)
        .with_context(|| format!("Cannot evaluate {}", path.display()))?;
    println!("{}: {} [{}]", path.display(), result, result.code());
    Ok(result.code())
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_file(path),
        None => {
            warn!("No engine configuration file provided, using default limits");
            Ok(EngineConfig::default())
        }
    }
}
