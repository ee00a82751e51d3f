/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The schedule data model and the time-propagation algorithm.
//!
//! `compute_times()` is the hardest single piece of this crate: given a
//! `Schedule` whose entries are placed (their `start_progress`,
//! `stop_progress` and execution durations already set) but whose ready/
//! finish times are not yet known, it repeatedly sweeps every resource's
//! queue, advancing an entry only once its intra-task part order and its
//! DAG dependencies are satisfied, until every entry has been propagated
//! or a full pass makes no progress.

pub mod ext;
pub mod json;

use std::collections::HashMap;
use std::sync::Arc;

use crate::estimator::Estimator;
use crate::resource::{Resource, ResourceId};
use crate::task::{Task, TaskCopy, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Todo,
    Done,
    Aborted,
}

/// One contiguous part of one task, pinned to one resource.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    pub task_id: TaskId,
    pub task: Arc<Task>,
    pub state: EntryState,
    pub start_progress: u32,
    pub stop_progress: u32,
    pub part_number: u32,

    pub time_ready: f64,
    pub time_finish: f64,
    pub dur_init: f64,
    pub dur_compute: f64,
    pub dur_fini: f64,
    pub dur_total: f64,
    pub dur_break: f64,
    pub energy: f64,
}

impl TaskEntry {
    pub fn new(task: Arc<Task>, start_progress: u32, stop_progress: u32) -> Self {
        assert!(start_progress < stop_progress);
        assert!(stop_progress <= task.checkpoints);
        TaskEntry {
            task_id: task.id,
            task,
            state: EntryState::Todo,
            start_progress,
            stop_progress,
            part_number: 0,
            time_ready: 0.0,
            time_finish: 0.0,
            dur_init: 0.0,
            dur_compute: 0.0,
            dur_fini: 0.0,
            dur_total: 0.0,
            dur_break: 0.0,
            energy: 0.0,
        }
    }

    /// Sets execution time/energy fields from the estimator. If
    /// `continuing` is true (this is slot 0 and the task is already
    /// running on `resource`), init time and init energy are zeroed: a
    /// continuing task does not re-pay initialisation.
    pub fn compute_execution_time<E: Estimator>(
        &mut self,
        resource: &Resource,
        estimator: &E,
        continuing: bool,
    ) {
        let init = if continuing { 0.0 } else { estimator.time_init(&self.task, resource) };
        let compute = estimator.time_compute(&self.task, resource, self.start_progress, self.stop_progress);
        let fini = estimator.time_fini(&self.task, resource);
        let energy_init = if continuing { 0.0 } else { estimator.energy_init(&self.task, resource) };
        let energy_compute =
            estimator.energy_compute(&self.task, resource, self.start_progress, self.stop_progress);
        let energy_fini = estimator.energy_fini(&self.task, resource);

        self.dur_init = init;
        self.dur_compute = compute;
        self.dur_fini = fini;
        self.dur_total = init + compute + fini;
        self.energy = energy_init + energy_compute + energy_fini;
    }
}

/// Per-resource queues of task-part entries plus running-task snapshot
/// and aggregate time/energy totals.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub id: u64,
    pub resources: Vec<Resource>,
    pub tasks_by_resource: Vec<Vec<TaskEntry>>,
    pub running_tasks: Vec<Option<TaskId>>,
    /// The full input task set this schedule was built from, by id —
    /// used by `compute_times()` to resolve dependency predecessors and
    /// a task's overall checkpoint count.
    pub tasks: HashMap<TaskId, TaskCopy>,

    pub active_tasks: usize,
    pub makespan: f64,
    pub static_energy: f64,
    pub dynamic_energy: f64,
    pub total_energy: f64,

    /// Set by the caller, not read internally (the core never touches
    /// the wall clock inside `compute_times()`).
    pub compute_start_ns: u64,
    pub compute_stop_ns: u64,
}

impl Schedule {
    pub fn new(resources: Vec<Resource>, tasks: Vec<TaskCopy>) -> Self {
        let n = resources.len();
        let tasks: HashMap<TaskId, TaskCopy> = tasks.into_iter().map(|t| (t.id, t)).collect();
        Schedule {
            id: 0,
            resources,
            tasks_by_resource: vec![Vec::new(); n],
            running_tasks: vec![None; n],
            tasks,
            active_tasks: 0,
            makespan: 0.0,
            static_energy: 0.0,
            dynamic_energy: 0.0,
            total_energy: 0.0,
            compute_start_ns: 0,
            compute_stop_ns: 0,
        }
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Propagates ready/finish times across every resource queue,
    /// honouring machine order, intra-task part order, and DAG
    /// dependencies; then recomputes break times, makespan and energy
    /// totals. Logs (but does not fail) if a full pass makes no
    /// progress — the schedule it leaves behind is the partially
    /// propagated one, per the non-fatal invariant-violation policy.
    pub fn compute_times(&mut self) {
        let resources = self.resources.len();

        // Build the task-parts multimap and per-task counters up front.
        let mut parts_by_task: HashMap<TaskId, Vec<(ResourceId, usize, u32)>> = HashMap::new();
        for (rix, queue) in self.tasks_by_resource.iter().enumerate() {
            for (eix, entry) in queue.iter().enumerate() {
                parts_by_task.entry(entry.task_id).or_default().push((rix, eix, entry.stop_progress));
            }
        }

        let mut cur = vec![0usize; resources];
        let mut last_part: HashMap<TaskId, i64> = HashMap::new();
        let mut last_progress: HashMap<TaskId, u32> = HashMap::new();
        let mut last_part_entry: HashMap<TaskId, (ResourceId, usize)> = HashMap::new();
        let mut task_exist: HashMap<TaskId, (ResourceId, usize)> = HashMap::new();

        for (tid, task_copy) in &self.tasks {
            last_part.insert(*tid, -1);
            last_progress.insert(*tid, task_copy.progress);
        }

        loop {
            let mut progressed = false;

            for r in 0..resources {
                if cur[r] >= self.tasks_by_resource[r].len() {
                    continue;
                }
                let eix = cur[r];
                let tid = self.tasks_by_resource[r][eix].task_id;

                let prev_finish = if eix > 0 { self.tasks_by_resource[r][eix - 1].time_finish } else { 0.0 };
                let mut ready = prev_finish;

                let (start_progress, stop_progress) = {
                    let e = &self.tasks_by_resource[r][eix];
                    (e.start_progress, e.stop_progress)
                };

                // Part-ordering check.
                if let Some(parts) = parts_by_task.get(&tid) {
                    let part_count = parts.len();
                    if part_count > 1 {
                        let earlier = parts.iter().filter(|(_, _, sp)| *sp < stop_progress).count();
                        let lp = *last_part.get(&tid).unwrap_or(&-1);
                        if lp + 1 < earlier as i64 {
                            continue; // not the next part yet
                        }
                    }
                }

                if let (Some(lp), Some(lpe)) = (last_part.get(&tid).copied(), last_part_entry.get(&tid).copied())
                {
                    if lp >= 0 && last_progress.get(&tid).copied() == Some(start_progress) {
                        let (pr, pe) = lpe;
                        ready = ready.max(self.tasks_by_resource[pr][pe].time_finish);
                    }
                }

                // Dependency check: every in-scope predecessor must have
                // had its final part propagated.
                let mut dep_ready = ready;
                let mut deps_satisfied = true;
                if let Some(task_copy) = self.tasks.get(&tid) {
                    for pred in task_copy.predecessors() {
                        if !self.tasks.contains_key(pred) {
                            continue; // predecessor out of scope
                        }
                        match task_exist.get(pred) {
                            Some((pr, pe)) => {
                                dep_ready = dep_ready.max(self.tasks_by_resource[*pr][*pe].time_finish);
                            }
                            None => {
                                deps_satisfied = false;
                                break;
                            }
                        }
                    }
                }
                if !deps_satisfied {
                    continue;
                }
                ready = dep_ready;

                let dur_total = self.tasks_by_resource[r][eix].dur_total;
                let next_part = last_part.get(&tid).copied().unwrap_or(-1) + 1;

                {
                    let e = &mut self.tasks_by_resource[r][eix];
                    e.time_ready = ready;
                    e.time_finish = ready + dur_total;
                    e.part_number = next_part as u32;
                }

                last_part.insert(tid, next_part);
                last_progress.insert(tid, stop_progress);
                last_part_entry.insert(tid, (r, eix));

                if let Some(task_copy) = self.tasks.get(&tid) {
                    if stop_progress == task_copy.checkpoints {
                        task_exist.insert(tid, (r, eix));
                    }
                }

                cur[r] += 1;
                progressed = true;
            }

            if !progressed {
                let remaining: usize =
                    (0..resources).map(|r| self.tasks_by_resource[r].len() - cur[r]).sum();
                if remaining > 0 {
                    tracing::error!(
                        remaining,
                        "compute_times: full pass made no progress, schedule left partially propagated"
                    );
                }
                break;
            }
            if (0..resources).all(|r| cur[r] >= self.tasks_by_resource[r].len()) {
                break;
            }
        }

        self.finalize_timings();
    }

    fn finalize_timings(&mut self) {
        let mut makespan = 0.0f64;
        let mut static_energy = 0.0f64;
        let mut dynamic_energy = 0.0f64;

        for (rix, queue) in self.tasks_by_resource.iter_mut().enumerate() {
            for i in 0..queue.len() {
                let next_ready = if i + 1 < queue.len() { Some(queue[i + 1].time_ready) } else { None };
                let finish = queue[i].time_finish;
                queue[i].dur_break = next_ready.map(|nr| (nr - finish).max(0.0)).unwrap_or(0.0);
                dynamic_energy += queue[i].energy;
            }
            if let Some(last) = queue.last() {
                makespan = makespan.max(last.time_finish);
                let resource = &self.resources[rix];
                static_energy += resource.idle_energy(last.time_finish);
            }
        }

        self.makespan = makespan;
        self.static_energy = static_energy;
        self.dynamic_energy = dynamic_energy;
        self.total_energy = static_energy + dynamic_energy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{CostSample, LinearEstimator};

    fn resources(n: usize) -> Vec<Resource> {
        (0..n).map(|i| Resource::new(i, format!("r{i}")).with_idle_power(1.0)).collect()
    }

    fn chain_task(id: TaskId, name: &str, preds: &[TaskId], resource: &str, init: f64, compute: f64, fini: f64) -> Arc<Task> {
        chain_task_on(id, name, preds, 0, resource, init, compute, fini)
    }

    fn chain_task_on(
        id: TaskId,
        name: &str,
        preds: &[TaskId],
        resource_id: ResourceId,
        resource: &str,
        init: f64,
        compute: f64,
        fini: f64,
    ) -> Arc<Task> {
        let mut t = Task::new(id, name, 10).with_compatible([resource_id]).with_cost(
            resource,
            CostSample { time_init: init, time_compute_full: compute, time_fini: fini, energy_compute_full: 0.0 },
        );
        for p in preds {
            t = t.with_predecessor(*p);
        }
        Arc::new(t)
    }

    #[test]
    fn s2_dependency_chain() {
        // T1 -> T2, both compatible only with R0, costs {0,4,0} each.
        let t1 = chain_task(1, "t1", &[], "r0", 0.0, 4.0, 0.0);
        let t2 = chain_task(2, "t2", &[1], "r0", 0.0, 4.0, 0.0);
        let res = resources(1);
        let est = LinearEstimator;

        let copies = vec![TaskCopy::of(&t1), TaskCopy::of(&t2)];
        let mut sched = Schedule::new(res.clone(), copies);

        let mut e1 = TaskEntry::new(t1.clone(), 0, 10);
        e1.compute_execution_time(&res[0], &est, false);
        let mut e2 = TaskEntry::new(t2.clone(), 0, 10);
        e2.compute_execution_time(&res[0], &est, false);
        sched.tasks_by_resource[0].push(e1);
        sched.tasks_by_resource[0].push(e2);

        sched.compute_times();

        assert_eq!(sched.tasks_by_resource[0][0].time_ready, 0.0);
        assert_eq!(sched.tasks_by_resource[0][0].time_finish, 4.0);
        assert_eq!(sched.tasks_by_resource[0][1].time_ready, 4.0);
        assert_eq!(sched.tasks_by_resource[0][1].time_finish, 8.0);
        assert_eq!(sched.makespan, 8.0);
    }

    #[test]
    fn static_energy_uses_each_resources_own_last_finish() {
        let t1 = chain_task_on(1, "t1", &[], 0, "r0", 0.0, 2.0, 0.0);
        let t2 = chain_task_on(2, "t2", &[], 1, "r1", 0.0, 5.0, 0.0);

        let res = resources(2);
        let est = LinearEstimator;
        let copies = vec![TaskCopy::of(&t1), TaskCopy::of(&t2)];
        let mut sched = Schedule::new(res.clone(), copies);

        let mut e1 = TaskEntry::new(t1.clone(), 0, 10);
        e1.compute_execution_time(&res[0], &est, false);
        sched.tasks_by_resource[0].push(e1);

        let mut e2 = TaskEntry::new(t2.clone(), 0, 10);
        e2.compute_execution_time(&res[1], &est, false);
        sched.tasks_by_resource[1].push(e2);

        sched.compute_times();

        // static energy = 1.0*2.0 (r0 last finish) + 1.0*5.0 (r1 last finish), not global makespan * 2
        assert_eq!(sched.static_energy, 2.0 + 5.0);
        assert_eq!(sched.makespan, 5.0);
    }

    #[test]
    fn idempotent_propagation() {
        let t1 = chain_task(1, "t1", &[], "r0", 1.0, 4.0, 1.0);
        let res = resources(1);
        let est = LinearEstimator;
        let copies = vec![TaskCopy::of(&t1)];
        let mut sched = Schedule::new(res.clone(), copies);
        let mut e1 = TaskEntry::new(t1.clone(), 0, 10);
        e1.compute_execution_time(&res[0], &est, false);
        sched.tasks_by_resource[0].push(e1);

        sched.compute_times();
        let first = (sched.tasks_by_resource[0][0].time_ready, sched.tasks_by_resource[0][0].time_finish);
        sched.compute_times();
        let second = (sched.tasks_by_resource[0][0].time_ready, sched.tasks_by_resource[0][0].time_finish);
        assert_eq!(first, second);
    }
}
