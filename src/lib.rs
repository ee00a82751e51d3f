/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Heterogeneous-resource DAG task scheduler.
//!
//! ```text
//! lib.rs
//! ├── error       – crate-wide SchedError
//! ├── resource    – compute resources (id, name, idle power)
//! ├── task        – Task / TaskCopy, DAG links, resource compatibility
//! ├── estimator   – time/energy cost model + file loaders
//! ├── schedule    – Schedule / TaskEntry, time propagation, JSON output
//! ├── algorithm   – mapping algorithms + registry
//! ├── migration   – intra-task two-part migration planner
//! ├── config      – YAML algorithm configuration
//! ├── timer       – background one-shot alarm
//! ├── logging     – mainlog tracing-subscriber wiring
//! └── eventlog    – eventlog/simlog JSON-per-line streams
//! ```

pub mod algorithm;
pub mod config;
pub mod error;
pub mod estimator;
pub mod eventlog;
pub mod logging;
pub mod migration;
pub mod resource;
pub mod schedule;
pub mod task;
pub mod timer;
