/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! HEFT: upward-rank list scheduling, with an optional two-part
//! migration variant per SPEC_FULL §4.6.4.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::schedule::ext::ScheduleExt;
use crate::schedule::{Schedule, TaskEntry};
use crate::task::{TaskCopy, TaskId};

use super::common::{compatible_resources, execution_time};
use super::MappingAlgorithm;

pub struct Heft {
    migration: bool,
}

impl Heft {
    pub fn new(migration: bool) -> Self {
        Heft { migration }
    }

    fn average_cost<E: Estimator>(task: &TaskCopy, resources: &[Resource], estimator: &E) -> f64 {
        let candidates = compatible_resources(task, resources);
        if candidates.is_empty() {
            return 0.0;
        }
        let sum: f64 = candidates.iter().map(|r| execution_time(task, r, estimator)).sum();
        sum / candidates.len() as f64
    }

    /// Fixed-point upward rank: `upward[t] = w[t] + max over successors
    /// s of upward[s]`. Converges in at most `tasks.len()` passes because
    /// each pass finalises at least the current sinks.
    fn upward_ranks(tasks: &[TaskCopy], w: &HashMap<TaskId, f64>) -> HashMap<TaskId, f64> {
        let mut upward: HashMap<TaskId, f64> = tasks.iter().map(|t| (t.id, w[&t.id])).collect();
        let index: HashMap<TaskId, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

        loop {
            let mut changed = false;
            for t in tasks {
                let successor_max = t
                    .successors()
                    .iter()
                    .filter_map(|s| index.get(s))
                    .map(|&i| upward[&tasks[i].id])
                    .fold(0.0, f64::max);
                let candidate = w[&t.id] + successor_max;
                let entry = upward.get_mut(&t.id).unwrap();
                if (candidate - *entry).abs() > 1e-12 {
                    *entry = candidate;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        upward
    }
}

impl MappingAlgorithm for Heft {
    fn name(&self) -> &'static str {
        if self.migration {
            "heftmig"
        } else {
            "heft"
        }
    }

    fn compute<E: Estimator>(
        &self,
        tasks: Vec<TaskCopy>,
        resources: Vec<Resource>,
        running: Vec<Option<TaskCopy>>,
        interrupt: &AtomicBool,
        _progress_updated: bool,
        estimator: &E,
    ) -> Option<Schedule> {
        tracing::info!(algorithm = self.name(), task_count = tasks.len(), "mapping start");

        let w: HashMap<TaskId, f64> =
            tasks.iter().map(|t| (t.id, Self::average_cost(t, &resources, estimator))).collect();
        let upward = Self::upward_ranks(&tasks, &w);

        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by(|&a, &b| upward[&tasks[b].id].total_cmp(&upward[&tasks[a].id]));

        let mut schedule = Schedule::new(resources.clone(), tasks.clone());
        schedule.active_tasks = tasks.len();
        for (rix, r) in running.iter().enumerate() {
            schedule.running_tasks[rix] = r.as_ref().map(|t| t.id);
        }
        let mut ext = ScheduleExt::new(schedule);

        for ix in order {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name(), "interrupted");
                return None;
            }
            let task = &tasks[ix];
            let candidates = compatible_resources(task, &resources);
            if candidates.is_empty() {
                tracing::warn!(algorithm = self.name(), task = task.id, "no compatible resource");
                continue;
            }

            let task_ready = ext.task_ready_time(task.id);
            let duration_full = execution_time(task, candidates[0], estimator);

            // Non-migration best slot across candidate resources.
            let mut best: Option<(usize, usize, f64, f64, f64)> = None; // (resource, slot, start, stop, finish)
            for r in &candidates {
                let duration = execution_time(task, r, estimator);
                let (slot, start, stop) = ext.find_slot(r.id, duration, task_ready, 0);
                let finish = stop;
                if best.map(|(_, _, _, _, f)| finish < f).unwrap_or(true) {
                    best = Some((r.id, slot, start, stop, finish));
                }
            }
            let Some((best_resource, best_slot, _best_start, _best_stop, best_finish)) = best else {
                continue;
            };

            if !self.migration || candidates.len() < 2 {
                let _ = best_slot;
                let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
                ext.add_entry(entry, best_resource, None, estimator);
                continue;
            }

            // Two-part migration candidate search per SPEC_FULL §4.6.4.
            if let Some(candidate) =
                migration_candidate(&ext, task, &candidates, task_ready, duration_full, estimator)
            {
                if candidate.finish_b < best_finish {
                    let entry_a = TaskEntry::new(task.original.clone(), task.progress, candidate.part_a_stop);
                    ext.add_entry(entry_a, candidate.resource_a, None, estimator);
                    let entry_b = TaskEntry::new(task.original.clone(), candidate.part_a_stop, task.checkpoints);
                    ext.add_entry(entry_b, candidate.resource_b, None, estimator);
                    continue;
                }
            }

            let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
            ext.add_entry(entry, best_resource, None, estimator);
        }

        Some(ext.into_schedule())
    }
}

struct MigrationCandidate {
    resource_a: usize,
    resource_b: usize,
    part_a_stop: u32,
    finish_b: f64,
}

/// Enumerates `(resource_a, slot_a, resource_b, slot_b)` pairs as
/// described in SPEC_FULL §4.6.4 and returns the one with the earliest
/// `finish_b`, if any candidate is feasible (`points_a > 0` and
/// `points_b > 0`).
fn migration_candidate<E: Estimator>(
    ext: &ScheduleExt,
    task: &TaskCopy,
    candidates: &[&Resource],
    task_ready: f64,
    _duration_full: f64,
    estimator: &E,
) -> Option<MigrationCandidate> {
    let mut best: Option<MigrationCandidate> = None;

    for ra in candidates {
        let init_a = estimator.time_init(&task.original, ra);
        let fini_a = estimator.time_fini(&task.original, ra);
        let start_a = ext.resource_ready_time(ra.id).max(task_ready);

        // Part A's budget is bounded by how much compute fits on ra
        // before rb would be ready to take over; that bound depends on
        // which rb is paired, so it's computed per (ra, rb), not once
        // per ra.
        for rb in candidates {
            if rb.id == ra.id {
                continue;
            }
            let rb_ready = ext.resource_ready_time(rb.id);
            let budget_a = (rb_ready - start_a - init_a - fini_a).max(0.0);
            let points_a = estimator.time_compute_checkpoint(&task.original, ra, task.progress, budget_a);
            let remaining = task.checkpoints.saturating_sub(task.progress);
            if points_a == 0 || points_a >= remaining {
                continue;
            }
            let part_a_stop = task.progress + points_a;
            let finish_a = start_a
                + init_a
                + estimator.time_compute(&task.original, ra, task.progress, part_a_stop)
                + fini_a;

            let init_b = estimator.time_init(&task.original, rb);
            let fini_b = estimator.time_fini(&task.original, rb);
            let start_b = rb_ready.max(finish_a);
            let compute_b = estimator.time_compute(&task.original, rb, part_a_stop, task.checkpoints);
            let finish_b = start_b + init_b + compute_b + fini_b;

            if best.as_ref().map(|b| finish_b < b.finish_b).unwrap_or(true) {
                best = Some(MigrationCandidate { resource_a: ra.id, resource_b: rb.id, part_a_stop, finish_b });
            }
        }
    }

    best
}
