/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-set files.
//!
//! One task per line, four comma-separated integers:
//!
//! ```text
//! offset, computation_time, deadline, period
//! ```
//!
//! Blank lines and lines with a different number of fields are skipped.
//! Identifiers `1..=n` are given in file order.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::task::{TaskError, TaskSet, TaskSetBuilder, Time};

const FIELDS: usize = 4;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot access task file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: '{field}' is not a non-negative integer")]
    InvalidField { line: usize, field: String },

    #[error("line {line}: {source}")]
    InvalidTask {
        line: usize,
        #[source]
        source: TaskError,
    },
}

/// Read the task set stored at `path`.
///
/// # Errors
/// I/O failures, non-integer fields and invalid task parameters, each with
/// the offending line.
pub fn parse_task_set(path: &Path) -> Result<TaskSet, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let task_set = parse_str(&content)?;
    debug!(path = %path.display(), tasks = task_set.len(), "task set parsed");
    Ok(task_set)
}

/// Parse task-file content already in memory.
pub fn parse_str(content: &str) -> Result<TaskSet, ParseError> {
    let mut builder = TaskSetBuilder::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() != FIELDS {
            warn!(line, fields = fields.len(), "skipping row without exactly four fields");
            continue;
        }

        let mut values = [0 as Time; FIELDS];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse().map_err(|_| ParseError::InvalidField {
                line,
                field: (*field).to_string(),
            })?;
        }
        let [offset, computation_time, deadline, period] = values;
        builder
            .push(offset, computation_time, deadline, period)
            .map_err(|source| ParseError::InvalidTask { line, source })?;
    }

    Ok(builder.build())
}

/// Write `task_set` in the format [`parse_task_set`] reads.
///
/// # Errors
/// Returns [`ParseError::Io`] if the file cannot be written.
pub fn write_task_set(path: &Path, task_set: &TaskSet) -> Result<(), ParseError> {
    let out: String = task_set
        .iter()
        .map(|task| {
            format!(
                "{},{},{},{}\n",
                task.offset(),
                task.computation_time(),
                task.deadline(),
                task.period()
            )
        })
        .collect();
    fs::write(path, out).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
