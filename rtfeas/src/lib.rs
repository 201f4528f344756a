/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! rtfeas – schedulability oracle for periodic real-time task sets
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── task        – Task / Job / TaskSet model
//! ├── timing/     – hyperperiod, feasibility interval, busy period, DBF
//! ├── analysis/   – Liu & Layland, response-time analysis, processor demand
//! ├── sim/        – discrete-time simulation loop + Policy trait
//! ├── uniproc/    – RM, DM, Audsley, EDF, Round Robin on one processor
//! ├── multiproc/  – Global / Partitioned / clustered EDF(k)
//! ├── evaluate    – single entry point over both engines
//! ├── parse       – task-set files
//! ├── report      – per-batch result tally
//! ├── batch       – folder evaluation on a bounded worker pool
//! └── config/     – YAML engine limits and batch settings
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod evaluate;
pub mod multiproc;
pub mod parse;
pub mod report;
pub mod sim;
pub mod task;
pub mod timing;
pub mod uniproc;
