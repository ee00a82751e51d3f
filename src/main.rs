/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! CLI entry point: load the algorithm configuration, pick a mapper from
//! the registry, run it over a task set, print the resulting schedule as
//! JSON. Task-definition/group file loading is out of scope (see the
//! crate's module docs) so this binary ships a small built-in DAG to
//! exercise the registry end to end; `SCHED_CONFIG` is honoured the same
//! way it would be by a caller wiring a real task source in front of it.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use heterosched::algorithm::AlgorithmRegistry;
use heterosched::config::SchedulerConfigManager;
use heterosched::estimator::CostSample;
use heterosched::resource::Resource;
use heterosched::task::{Task, TaskCopy};

#[derive(Parser, Debug)]
#[command(name = "heterosched", about = "Heterogeneous-resource DAG task scheduler")]
struct Cli {
    /// Algorithm name, e.g. mct, heft, genetic, simann (see
    /// AlgorithmRegistry::names for the full list).
    #[arg(short, long, default_value = "mct")]
    algorithm: String,

    /// YAML algorithm-tuning file. Falls back to `SCHED_CONFIG` if unset,
    /// and to every algorithm's own defaults if neither is given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// A small built-in DAG (three tasks across two resources) used when no
/// external task source is wired in front of this binary.
fn demo_tasks_and_resources() -> (Vec<TaskCopy>, Vec<Resource>) {
    let t1 = Arc::new(
        Task::new(1, "ingest", 10)
            .with_compatible([0, 1])
            .with_cost("r0", CostSample { time_init: 0.2, time_compute_full: 4.0, time_fini: 0.1, energy_compute_full: 2.0 })
            .with_cost("r1", CostSample { time_init: 0.1, time_compute_full: 3.0, time_fini: 0.1, energy_compute_full: 2.5 }),
    );
    let t2 = Arc::new(
        Task::new(2, "transform", 10)
            .with_predecessor(1)
            .with_compatible([0, 1])
            .with_cost("r0", CostSample { time_init: 0.1, time_compute_full: 5.0, time_fini: 0.1, energy_compute_full: 3.0 })
            .with_cost("r1", CostSample { time_init: 0.2, time_compute_full: 6.0, time_fini: 0.1, energy_compute_full: 3.5 }),
    );
    let t3 = Arc::new(
        Task::new(3, "emit", 10)
            .with_predecessor(2)
            .with_compatible([0, 1])
            .with_cost("r0", CostSample { time_init: 0.1, time_compute_full: 2.0, time_fini: 0.1, energy_compute_full: 1.0 })
            .with_cost("r1", CostSample { time_init: 0.1, time_compute_full: 2.5, time_fini: 0.1, energy_compute_full: 1.2 }),
    );

    let tasks = vec![TaskCopy::of(&t1), TaskCopy::of(&t2), TaskCopy::of(&t3)];
    let resources = vec![
        Resource::new(0, "r0").with_idle_power(1.5),
        Resource::new(1, "r1").with_idle_power(2.0),
    ];
    (tasks, resources)
}

fn main() -> anyhow::Result<()> {
    heterosched::logging::init();

    let cli = Cli::parse();

    let mut manager = SchedulerConfigManager::new();
    let config_path = cli.config.or_else(|| std::env::var("SCHED_CONFIG").ok().map(PathBuf::from));
    if let Some(path) = config_path {
        manager.load_from_file(&path)?;
    } else {
        tracing::info!("no SCHED_CONFIG given, every algorithm uses its defaults");
    }

    let registry = AlgorithmRegistry::with_defaults(manager.algorithms());
    let algorithm = registry.get(&cli.algorithm)?;

    let (tasks, resources) = demo_tasks_and_resources();
    let running = vec![None; resources.len()];
    let interrupt = AtomicBool::new(false);

    let schedule = algorithm
        .compute_dyn(tasks, resources, running, &interrupt, true)
        .ok_or_else(|| anyhow::anyhow!("{} produced no schedule", cli.algorithm))?;

    println!("{}", schedule.to_json_string()?);
    Ok(())
}
