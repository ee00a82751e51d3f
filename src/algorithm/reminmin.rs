/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! ReMinMin: a Min-Min skeleton re-scored by projected total energy
//! instead of completion time, per SPEC_FULL §4.6.5.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::schedule::ext::ScheduleExt;
use crate::schedule::{Schedule, TaskEntry};
use crate::task::TaskCopy;

use super::common::execution_time;
use super::MappingAlgorithm;

pub struct ReMinMin {
    migration: bool,
}

impl ReMinMin {
    pub fn new(migration: bool) -> Self {
        ReMinMin { migration }
    }

    /// Projected total energy if `task` is placed on `resource` right
    /// now: static energy over the makespan this placement would extend
    /// to, plus dynamic energy accumulated so far, plus this task's own
    /// dynamic energy.
    fn projected_energy<E: Estimator>(
        ext: &ScheduleExt,
        resources: &[Resource],
        dynamic_so_far: f64,
        task: &TaskCopy,
        resource: &Resource,
        estimator: &E,
    ) -> (f64, f64) {
        let resource_ready = ext.resource_ready_time(resource.id);
        let task_ready = ext.task_ready_time_resource(task.id, resource.id, estimator);
        let ready = resource_ready.max(task_ready);
        let duration = execution_time(task, resource, estimator);
        let finish = ready + duration;

        // Projected static energy: each resource's own last-finish time,
        // using `finish` for the resource under consideration and each
        // other resource's current queue tail otherwise (same per-resource
        // model as `Schedule::compute_times()`, see DESIGN.md Open
        // Question 1).
        let static_energy: f64 = resources
            .iter()
            .map(|r| {
                let last_finish = if r.id == resource.id { finish } else { ext.resource_ready_time(r.id) };
                r.idle_energy(last_finish)
            })
            .sum();

        let this_energy = estimator.energy_init(&task.original, resource)
            + estimator.energy_compute(&task.original, resource, task.progress, task.checkpoints)
            + estimator.energy_fini(&task.original, resource);

        let total = static_energy + dynamic_so_far + this_energy;
        (total, finish)
    }

    /// Migration counterpart of `projected_energy`: enumerates
    /// `(resource_a, resource_b)` pairs as HEFT's migration variant does
    /// (§4.6.4) but scores each by projected total energy rather than
    /// finish time, per §4.6.5.
    #[allow(clippy::too_many_arguments)]
    fn projected_energy_migration<E: Estimator>(
        ext: &ScheduleExt,
        resources: &[Resource],
        dynamic_so_far: f64,
        task: &TaskCopy,
        candidates: &[&Resource],
        estimator: &E,
    ) -> Option<(f64, f64, usize, u32, usize)> {
        let task_ready = ext.task_ready_time(task.id);
        let mut best: Option<(f64, f64, usize, u32, usize)> = None; // (energy, finish_b, resource_a, split, resource_b)

        for ra in candidates {
            let start_a = ext.resource_ready_time(ra.id).max(task_ready);
            let init_a = estimator.time_init(&task.original, ra);
            let fini_a = estimator.time_fini(&task.original, ra);

            // Part A's budget is bounded by how much compute fits on ra
            // before rb would be ready to take over; that bound depends
            // on which rb is paired, so it's computed per (ra, rb).
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
                let split = task.progress + points_a;
                let finish_a =
                    start_a + init_a + estimator.time_compute(&task.original, ra, task.progress, split) + fini_a;

                let start_b = rb_ready.max(finish_a);
                let init_b = estimator.time_init(&task.original, rb);
                let fini_b = estimator.time_fini(&task.original, rb);
                let compute_b = estimator.time_compute(&task.original, rb, split, task.checkpoints);
                let finish_b = start_b + init_b + compute_b + fini_b;

                let static_energy: f64 = resources
                    .iter()
                    .map(|r| {
                        let last_finish = if r.id == ra.id {
                            finish_a
                        } else if r.id == rb.id {
                            finish_b
                        } else {
                            ext.resource_ready_time(r.id)
                        };
                        r.idle_energy(last_finish)
                    })
                    .sum();
                let this_energy = estimator.energy_init(&task.original, ra)
                    + estimator.energy_compute(&task.original, ra, task.progress, split)
                    + estimator.energy_fini(&task.original, ra)
                    + estimator.energy_init(&task.original, rb)
                    + estimator.energy_compute(&task.original, rb, split, task.checkpoints)
                    + estimator.energy_fini(&task.original, rb);
                let total = static_energy + dynamic_so_far + this_energy;

                if best.map(|(e, ..)| total < e).unwrap_or(true) {
                    best = Some((total, finish_b, ra.id, split, rb.id));
                }
            }
        }
        best
    }
}

impl MappingAlgorithm for ReMinMin {
    fn name(&self) -> &'static str {
        if self.migration {
            "reminminmig"
        } else {
            "reminmin"
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

        let mut schedule = Schedule::new(resources.clone(), tasks.clone());
        schedule.active_tasks = tasks.len();
        for (rix, r) in running.iter().enumerate() {
            schedule.running_tasks[rix] = r.as_ref().map(|t| t.id);
        }
        let mut ext = ScheduleExt::new(schedule);

        let mut mapped = vec![false; tasks.len()];
        let mut remaining = tasks.len();
        let mut dynamic_so_far = 0.0f64;

        while remaining > 0 {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name(), "interrupted");
                return None;
            }

            let ready: Vec<usize> =
                (0..tasks.len()).filter(|&i| !mapped[i] && ext.task_dep_satisfied(tasks[i].id)).collect();
            if ready.is_empty() {
                break;
            }

            let mut best: Option<(usize, usize, f64, f64)> = None; // (task_ix, resource, energy, finish)
            for &tix in &ready {
                let task = &tasks[tix];
                for r in &resources {
                    if !task.valid_resource(r.id) {
                        continue;
                    }
                    let (energy, finish) =
                        Self::projected_energy(&ext, &resources, dynamic_so_far, task, r, estimator);
                    if best.map(|(_, _, e, _)| energy < e).unwrap_or(true) {
                        best = Some((tix, r.id, energy, finish));
                    }
                }
            }

            let Some((tix, resource_id, single_energy, _finish)) = best else {
                break;
            };
            let task = &tasks[tix];
            let candidates = super::common::compatible_resources(task, &resources);

            let migration_candidate = if self.migration && candidates.len() >= 2 {
                Self::projected_energy_migration(&ext, &resources, dynamic_so_far, task, &candidates, estimator)
            } else {
                None
            };

            if let Some((energy, _finish_b, ra, split, rb)) = migration_candidate {
                if energy < single_energy {
                    let entry_a = TaskEntry::new(task.original.clone(), task.progress, split);
                    ext.add_entry(entry_a, ra, None, estimator);
                    let entry_b = TaskEntry::new(task.original.clone(), split, task.checkpoints);
                    ext.add_entry(entry_b, rb, None, estimator);
                    dynamic_so_far = energy;
                    mapped[tix] = true;
                    remaining -= 1;
                    continue;
                }
            }

            let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
            let energy_before = dynamic_so_far;
            ext.add_entry(entry, resource_id, None, estimator);
            dynamic_so_far = energy_before
                + estimator.energy_init(&task.original, &resources[resource_id])
                + estimator.energy_compute(&task.original, &resources[resource_id], task.progress, task.checkpoints)
                + estimator.energy_fini(&task.original, &resources[resource_id]);
            mapped[tix] = true;
            remaining -= 1;
        }

        Some(ext.into_schedule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{CostSample, LinearEstimator};
    use crate::task::Task;
    use std::sync::Arc;

    #[test]
    fn picks_lower_energy_resource() {
        let t = Task::new(1, "t1", 10)
            .with_compatible([0, 1])
            .with_cost(
                "r0",
                CostSample { time_init: 0.0, time_compute_full: 5.0, time_fini: 0.0, energy_compute_full: 2.0 },
            )
            .with_cost(
                "r1",
                CostSample { time_init: 0.0, time_compute_full: 5.0, time_fini: 0.0, energy_compute_full: 20.0 },
            );
        let tasks = vec![TaskCopy::of(&Arc::new(t))];
        let resources =
            vec![Resource::new(0, "r0").with_idle_power(0.0), Resource::new(1, "r1").with_idle_power(0.0)];
        let algo = ReMinMin::new(false);
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None, None], &interrupt, true, &est).unwrap();
        assert_eq!(sched.tasks_by_resource[0].len(), 1);
        assert_eq!(sched.tasks_by_resource[1].len(), 0);
    }

    #[test]
    fn reminminmig_matches_reminmin_when_there_is_no_congestion() {
        // With every resource idle, rb's ready time equals ra's start, so
        // part A's budget (rb_ready - start_a - init_a - fini_a) is zero
        // or negative whenever there's any init/fini cost - the migration
        // candidate search finds nothing and falls back to the single-
        // resource placement, same as the non-migration variant.
        let t = Task::new(1, "t1", 10)
            .with_compatible([0, 1])
            .with_cost("r0", CostSample { time_init: 0.0, time_compute_full: 5.0, time_fini: 0.0, energy_compute_full: 2.0 })
            .with_cost("r1", CostSample { time_init: 0.0, time_compute_full: 5.0, time_fini: 0.0, energy_compute_full: 20.0 });
        let tasks = vec![TaskCopy::of(&Arc::new(t))];
        let resources =
            vec![Resource::new(0, "r0").with_idle_power(0.0), Resource::new(1, "r1").with_idle_power(0.0)];
        let algo = ReMinMin::new(true);
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None, None], &interrupt, true, &est).unwrap();
        let total_entries: usize = sched.tasks_by_resource.iter().map(|q| q.len()).sum();
        assert_eq!(total_entries, 1, "uncongested task should stay a single part");
    }

    #[test]
    fn migration_candidate_search_finds_a_split_when_r0_is_congested() {
        // R0 busy until t=10 (filler entry), R1 idle. Same timing shape as
        // heft.rs's S6 case: ra=R1/rb=R0 splits at checkpoint 3, finish_b=17.
        let t1 = Arc::new(
            Task::new(1, "t1", 8)
                .with_compatible([0, 1])
                .with_cost("r0", CostSample { time_init: 1.0, time_compute_full: 8.0, time_fini: 1.0, energy_compute_full: 0.0 })
                .with_cost("r1", CostSample { time_init: 2.0, time_compute_full: 16.0, time_fini: 2.0, energy_compute_full: 0.0 }),
        );
        let resources =
            vec![Resource::new(0, "r0").with_idle_power(1.0), Resource::new(1, "r1").with_idle_power(1.0)];
        let task = TaskCopy::of(&t1);
        let candidates: Vec<&Resource> = resources.iter().collect();

        let mut schedule = Schedule::new(resources.clone(), vec![]);
        let filler = Arc::new(Task::new(99, "filler", 1));
        let mut filler_entry = TaskEntry::new(filler, 0, 1);
        filler_entry.time_ready = 0.0;
        filler_entry.time_finish = 10.0;
        schedule.tasks_by_resource[0].push(filler_entry);
        let ext = ScheduleExt::new(schedule);

        let est = LinearEstimator;
        let (energy, finish_b, resource_a, split, resource_b) =
            ReMinMin::projected_energy_migration(&ext, &resources, 0.0, &task, &candidates, &est).unwrap();
        assert_eq!(resource_a, 1);
        assert_eq!(resource_b, 0);
        assert_eq!(split, 3);
        assert_eq!(finish_b, 17.0);
        // static energy = idle_power(1.0)*finish_a(10) on r1 + idle_power(1.0)*finish_b(17) on r0
        assert_eq!(energy, 27.0);
    }
}
