/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Engine configuration: simulation limits and batch settings.
//!
//! Every field is optional; absent values keep their defaults.
//! ```yaml
//! limits:
//!   max_iterations: 50000000     # simulation cycles before refusing to simulate
//!   max_seconds: 30              # wall-clock budget of one simulation
//!   fixpoint_cap: 10000000       # absolute cap on first-idle-point iteration
//!   dbf_max_points: 100000       # deadlines visited by the demand test
//! batch:
//!   workers: 8                   # concurrent task-set evaluations
//!   task_set_timeout_secs: 60    # per task set, evaluation and cross-check each
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::task::Time;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineConfigFile {
    #[serde(default)]
    limits: LimitsEntry,
    #[serde(default)]
    batch: BatchEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsEntry {
    max_iterations: Option<u64>,
    max_seconds: Option<u64>,
    fixpoint_cap: Option<Time>,
    dbf_max_points: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchEntry {
    workers: Option<usize>,
    task_set_timeout_secs: Option<u64>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Bounds every evaluation must respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// Largest `horizon / step` a simulation may run.
    pub max_iterations: u64,
    /// Wall-clock budget of a single simulation, in seconds.
    pub max_seconds: u64,
    pub fixpoint_cap: Time,
    pub dbf_max_points: usize,
}

impl Limits {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_seconds)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: 50_000_000,
            max_seconds: 30,
            fixpoint_cap: 10_000_000,
            dbf_max_points: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchConfig {
    pub workers: usize,
    pub task_set_timeout_secs: u64,
}

impl BatchConfig {
    pub fn task_set_timeout(&self) -> Duration {
        Duration::from_secs(self.task_set_timeout_secs)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            task_set_timeout_secs: 60,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    pub limits: Limits,
    pub batch: BatchConfig,
}

impl EngineConfig {
    /// Parse `path`, filling absent fields with defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading engine configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Parse a YAML document.  An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: EngineConfigFile = if content.trim().is_empty() {
            EngineConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        let defaults = Self::default();
        let mut config = Self {
            limits: Limits {
                max_iterations: file
                    .limits
                    .max_iterations
                    .unwrap_or(defaults.limits.max_iterations),
                max_seconds: file.limits.max_seconds.unwrap_or(defaults.limits.max_seconds),
                fixpoint_cap: file.limits.fixpoint_cap.unwrap_or(defaults.limits.fixpoint_cap),
                dbf_max_points: file
                    .limits
                    .dbf_max_points
                    .unwrap_or(defaults.limits.dbf_max_points),
            },
            batch: BatchConfig {
                workers: file.batch.workers.unwrap_or(defaults.batch.workers),
                task_set_timeout_secs: file
                    .batch
                    .task_set_timeout_secs
                    .unwrap_or(defaults.batch.task_set_timeout_secs),
            },
        };

        if config.batch.workers == 0 {
            warn!("batch.workers = 0 is not usable, falling back to 1 worker");
            config.batch.workers = 1;
        }

        debug!(
            max_iterations = config.limits.max_iterations,
            max_seconds = config.limits.max_seconds,
            fixpoint_cap = config.limits.fixpoint_cap,
            dbf_max_points = config.limits.dbf_max_points,
            workers = config.batch.workers,
            task_set_timeout_secs = config.batch.task_set_timeout_secs,
            "engine configuration"
        );
        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
