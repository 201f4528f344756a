/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

mod generate;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use rtfeas::parse::write_task_set;
use rtfeas::task::Time;

use generate::{generate, DeadlineKind, GeneratorParams};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Synthetic periodic task-set corpus generator.
///
/// Example:
///   rtfeas-gen --out tasksets/ --sets 1000 --tasks 10 --utilization 0.9 --seed 42
#[derive(Debug, Parser)]
#[command(name = "rtfeas-gen", about = "Generate random task-set files for rtfeas", long_about = None)]
struct Cli {
    /// Output folder (created if missing).
    #[arg(short = 'o', long = "out")]
    out: PathBuf,

    /// Number of task sets to write.
    #[arg(short = 'n', long = "sets", default_value_t = 100)]
    sets: usize,

    /// Tasks per set.
    #[arg(short = 't', long = "tasks", default_value_t = 10)]
    tasks: usize,

    /// Total utilisation of each set.
    #[arg(short = 'u', long = "utilization")]
    utilization: f64,

    /// RNG seed; a random one is drawn and logged when absent.
    #[arg(long = "seed")]
    seed: Option<u64>,

    #[arg(long = "period-min", default_value_t = 10)]
    period_min: Time,

    #[arg(long = "period-max", default_value_t = 1000)]
    period_max: Time,

    #[arg(long = "deadlines", value_enum, default_value_t = DeadlineKind::Implicit)]
    deadlines: DeadlineKind,

    /// Offsets are drawn from [0, max-offset].
    #[arg(long = "max-offset", default_value_t = 0)]
    max_offset: Time,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let params = GeneratorParams {
        tasks: cli.tasks,
        utilization: cli.utilization,
        period_min: cli.period_min,
        period_max: cli.period_max,
        deadlines: cli.deadlines,
        max_offset: cli.max_offset,
    };
    params.validate().context("Invalid generator parameters")?;

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(
        out = %cli.out.display(),
        sets = cli.sets,
        tasks = cli.tasks,
        utilization = cli.utilization,
        seed,
        "Generating task sets"
    );

    fs::create_dir_all(&cli.out)
        .with_context(|| format!("Cannot create output folder: {}", cli.out.display()))?;

    let mut rng = StdRng::seed_from_u64(seed);
    for index in 0..cli.sets {
        let task_set = generate(&mut rng, &params)?;
        let path = cli.out.join(format!("taskset-{index:04}.csv"));
        write_task_set(&path, &task_set)?;
        debug!(path = %path.display(), "written");
    }

    info!(sets = cli.sets, "done");
    Ok(())
}
