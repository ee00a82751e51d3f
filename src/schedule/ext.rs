/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Assignment-side helpers layered on top of [`super::Schedule`]: slot
//! finding, entry insertion, dependency-satisfaction tracking, and the
//! progress-carry-forward used when re-scheduling a running task set.

use std::collections::{BTreeMap, HashMap};

use crate::estimator::Estimator;
use crate::resource::ResourceId;
use crate::task::TaskId;

use super::{EntryState, Schedule, TaskEntry};

/// `Schedule` plus the bookkeeping mappers need while still building an
/// assignment (as opposed to `compute_times()`'s read-only propagation
/// pass over an already-placed schedule).
pub struct ScheduleExt {
    pub schedule: Schedule,
    /// Highest part index mapped so far per task (`None` until the first
    /// part is placed).
    task_last_part: HashMap<TaskId, u32>,
    /// Ready time recorded for each task from its in-scope predecessors,
    /// updated incrementally as final parts are added.
    task_ready: HashMap<TaskId, f64>,
    /// True once every in-scope predecessor of a task has a ready time.
    task_dep_satisfied: HashMap<TaskId, bool>,
    /// Multimap task id -> (resource, index) of every entry placed so far.
    task_parts: BTreeMap<TaskId, Vec<(ResourceId, usize)>>,
}

impl ScheduleExt {
    pub fn new(schedule: Schedule) -> Self {
        let mut task_dep_satisfied = HashMap::new();
        for (tid, task_copy) in &schedule.tasks {
            let satisfied = task_copy
                .predecessors()
                .iter()
                .filter(|p| schedule.tasks.contains_key(*p))
                .count()
                == 0;
            task_dep_satisfied.insert(*tid, satisfied);
        }
        ScheduleExt {
            schedule,
            task_last_part: HashMap::new(),
            task_ready: HashMap::new(),
            task_dep_satisfied,
            task_parts: BTreeMap::new(),
        }
    }

    pub fn task_exists(&self, task_id: TaskId) -> bool {
        self.schedule.tasks.contains_key(&task_id)
    }

    pub fn task_last_part_mapped(&self, task_id: TaskId) -> Option<u32> {
        self.task_last_part.get(&task_id).copied()
    }

    pub fn task_dep_satisfied(&self, task_id: TaskId) -> bool {
        self.task_dep_satisfied.get(&task_id).copied().unwrap_or(true)
    }

    /// Max of final-part `time_finish` over in-scope predecessors
    /// recorded so far; `0.0` if none have finished yet (or there are
    /// none).
    pub fn task_ready_time(&self, task_id: TaskId) -> f64 {
        self.task_ready.get(&task_id).copied().unwrap_or(0.0)
    }

    /// Like `task_ready_time`, but if the task is already running on a
    /// *different* resource, also raises to that resource's projected
    /// finish for the task; if it is running on `resource` and that
    /// resource's queue is empty, returns `0.0` (continuing in place).
    pub fn task_ready_time_resource<E: Estimator>(
        &self,
        task_id: TaskId,
        resource: ResourceId,
        estimator: &E,
    ) -> f64 {
        let base = self.task_ready_time(task_id);
        for (rix, running) in self.schedule.running_tasks.iter().enumerate() {
            if *running != Some(task_id) {
                continue;
            }
            if rix == resource {
                if self.schedule.tasks_by_resource[resource].is_empty() {
                    return 0.0;
                }
                continue;
            }
            if let Some(task_copy) = self.schedule.tasks.get(&task_id) {
                let res = &self.schedule.resources[rix];
                let fini = estimator.time_fini(&task_copy.original, res);
                return base.max(fini);
            }
        }
        base
    }

    pub fn resource_ready_time(&self, resource: ResourceId) -> f64 {
        self.schedule.tasks_by_resource[resource].last().map(|e| e.time_finish).unwrap_or(0.0)
    }

    /// Scans `resource`'s queue from `start_slot` for the first gap of at
    /// least `duration` starting at or after `earliest_start`. Returns the
    /// slot index and writes the gap's `[start, stop)` into the out
    /// parameters.
    pub fn find_slot(
        &self,
        resource: ResourceId,
        duration: f64,
        earliest_start: f64,
        start_slot: usize,
    ) -> (usize, f64, f64) {
        let queue = &self.schedule.tasks_by_resource[resource];
        if queue.is_empty() {
            return (0, earliest_start, earliest_start + duration);
        }
        if start_slot == 0 {
            let first_ready = queue[0].time_ready;
            if first_ready - earliest_start >= duration {
                return (0, earliest_start, earliest_start + duration);
            }
        }
        for i in start_slot.max(0)..queue.len() {
            if i + 1 >= queue.len() {
                let start = queue[i].time_finish.max(earliest_start);
                return (i + 1, start, start + duration);
            }
            let gap_start = queue[i].time_finish.max(earliest_start);
            let gap_end = queue[i + 1].time_ready;
            if gap_end - gap_start >= duration {
                return (i + 1, gap_start, gap_start + duration);
            }
        }
        let start = queue.last().map(|e| e.time_finish).unwrap_or(earliest_start).max(earliest_start);
        (queue.len(), start, start + duration)
    }

    /// Inserts `entry` at `position` on `resource` (append if `None`),
    /// computing its execution time and ready/finish times, then — if it
    /// is the task's final part — updates dependency bookkeeping for its
    /// successors.
    pub fn add_entry<E: Estimator>(
        &mut self,
        mut entry: TaskEntry,
        resource: ResourceId,
        position: Option<usize>,
        estimator: &E,
    ) {
        let task_id = entry.task_id;
        let task = entry.task.clone();
        let checkpoints = task.checkpoints;
        let continuing = self.schedule.running_tasks[resource] == Some(task_id)
            && entry.start_progress == 0
            && self.schedule.tasks_by_resource[resource].is_empty();

        let res = self.schedule.resources[resource].clone();
        entry.compute_execution_time(&res, estimator, continuing);

        let prev_part_finish = self
            .task_last_part(task_id)
            .map(|(r, i)| self.schedule.tasks_by_resource[r][i].time_finish)
            .unwrap_or(0.0);
        let resource_ready = self.resource_ready_time(resource);
        let task_ready = self.task_ready_time_resource(task_id, resource, estimator);
        let ready = prev_part_finish.max(resource_ready).max(task_ready);

        entry.time_ready = ready;
        entry.time_finish = ready + entry.dur_total;
        entry.part_number = self.task_last_part.get(&task_id).map(|p| p + 1).unwrap_or(0);

        let queue = &mut self.schedule.tasks_by_resource[resource];
        let idx = match position {
            Some(p) => {
                queue.insert(p, entry);
                p
            }
            None => {
                queue.push(entry);
                queue.len() - 1
            }
        };

        self.task_last_part.insert(task_id, queue[idx].part_number);
        self.task_parts.entry(task_id).or_default().push((resource, idx));

        let is_final = queue[idx].stop_progress == checkpoints;
        if is_final {
            let finish = queue[idx].time_finish;
            if let Some(task_copy) = self.schedule.tasks.get(&task_id).cloned() {
                for succ in task_copy.successors() {
                    if !self.schedule.tasks.contains_key(succ) {
                        continue;
                    }
                    let entry = self.task_ready.entry(*succ).or_insert(0.0);
                    *entry = entry.max(finish);
                    self.recompute_dep_satisfied(*succ);
                }
            }
        }
    }

    fn recompute_dep_satisfied(&mut self, task_id: TaskId) {
        let Some(task_copy) = self.schedule.tasks.get(&task_id) else { return };
        let satisfied = task_copy
            .predecessors()
            .iter()
            .filter(|p| self.schedule.tasks.contains_key(*p))
            .all(|p| self.task_last_part_mapped(*p).is_some());
        self.task_dep_satisfied.insert(task_id, satisfied);
    }

    fn task_last_part(&self, task_id: TaskId) -> Option<(ResourceId, usize)> {
        self.task_parts.get(&task_id).and_then(|v| v.last().copied())
    }

    /// Reissues still-live entries from a prior schedule into this one,
    /// adjusting each entry's `start_progress` from current task
    /// progress. When `progress_updated` is true, progress is read
    /// directly from the live `Task`; otherwise it is estimated from
    /// elapsed wall time via `time_compute_checkpoint`.
    ///
    /// If the estimated new progress falls outside
    /// `[start_progress, stop_progress)`, the entry's `start_progress` is
    /// left unchanged — this mirrors the original implementation's
    /// silent no-op exactly (see DESIGN.md, Open Question 2); it is not
    /// treated as an error here.
    pub fn copy_entries<E: Estimator>(
        &mut self,
        old: &Schedule,
        progress_updated: bool,
        elapsed_seconds: f64,
        estimator: &E,
    ) {
        for (rix, queue) in old.tasks_by_resource.iter().enumerate() {
            for old_entry in queue {
                if old_entry.state == EntryState::Done || old_entry.state == EntryState::Aborted {
                    continue;
                }
                let Some(task_copy) = self.schedule.tasks.get(&old_entry.task_id) else { continue };

                let new_progress = if progress_updated {
                    task_copy.live_progress()
                } else {
                    let res = &old.resources[rix];
                    let reached = estimator.time_compute_checkpoint(
                        &old_entry.task,
                        res,
                        old_entry.start_progress,
                        elapsed_seconds,
                    );
                    old_entry.start_progress + reached
                };

                let mut new_entry = old_entry.clone();
                if new_progress < old_entry.stop_progress && new_progress >= old_entry.start_progress {
                    new_entry.start_progress = new_progress;
                }
                // else: silently keep the old start_progress (see doc comment above).

                if new_entry.start_progress >= new_entry.stop_progress {
                    continue;
                }

                self.schedule.tasks_by_resource[rix].push(new_entry);
            }
        }
    }

    pub fn into_schedule(mut self) -> Schedule {
        self.schedule.compute_times();
        self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::estimator::{CostSample, LinearEstimator};
    use crate::resource::Resource;
    use crate::task::{Task, TaskCopy};

    fn task(id: TaskId, resource_id: ResourceId, name: &str) -> Arc<Task> {
        Arc::new(Task::new(id, name, 10).with_compatible([resource_id]).with_cost(
            format!("r{resource_id}"),
            CostSample { time_init: 1.0, time_compute_full: 10.0, time_fini: 1.0, energy_compute_full: 0.0 },
        ))
    }

    #[test]
    fn find_slot_on_empty_queue_is_slot_zero() {
        let res = vec![Resource::new(0, "r0")];
        let sched = Schedule::new(res, vec![]);
        let ext = ScheduleExt::new(sched);
        let (slot, start, stop) = ext.find_slot(0, 5.0, 2.0, 0);
        assert_eq!(slot, 0);
        assert_eq!(start, 2.0);
        assert_eq!(stop, 7.0);
    }

    #[test]
    fn add_entry_sets_ready_and_finish_from_estimator() {
        let t1 = task(1, 0, "t1");
        let res = vec![Resource::new(0, "r0")];
        let copies = vec![TaskCopy::of(&t1)];
        let sched = Schedule::new(res, copies);
        let mut ext = ScheduleExt::new(sched);
        let est = LinearEstimator;

        let entry = TaskEntry::new(t1.clone(), 0, 10);
        ext.add_entry(entry, 0, None, &est);

        let placed = &ext.schedule.tasks_by_resource[0][0];
        assert_eq!(placed.time_ready, 0.0);
        assert_eq!(placed.time_finish, 12.0); // init 1 + compute 10 + fini 1
    }

    #[test]
    fn dependency_satisfaction_updates_after_final_part() {
        let t1 = Arc::new(Task::new(1, "t1", 10).with_compatible([0]).with_successor(2));
        let t2 = Arc::new(Task::new(2, "t2", 10).with_compatible([0]).with_predecessor(1));
        let res = vec![Resource::new(0, "r0")];
        let copies = vec![TaskCopy::of(&t1), TaskCopy::of(&t2)];
        let sched = Schedule::new(res, copies);
        let mut ext = ScheduleExt::new(sched);
        assert!(!ext.task_dep_satisfied(2));

        let est = LinearEstimator;
        let entry = TaskEntry::new(t1.clone(), 0, 10);
        ext.add_entry(entry, 0, None, &est);

        assert!(ext.task_dep_satisfied(2));
    }
}
