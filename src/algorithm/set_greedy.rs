/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Set-greedy mappers: Min-Min, Max-Min, Sufferage. All three maintain a
//! completion-time matrix over dependency-ready, unmapped tasks and
//! repeatedly pick one (task, resource) pair per round.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::schedule::ext::ScheduleExt;
use crate::schedule::{Schedule, TaskEntry};
use crate::task::TaskCopy;

use super::common::{completion_time, DOUBLE_MAX};
use super::MappingAlgorithm;

#[derive(Debug, Clone, Copy)]
enum Rule {
    MinMin,
    MaxMin,
    Sufferage,
}

pub struct SetGreedy {
    rule: Rule,
    name: &'static str,
}

impl SetGreedy {
    pub fn min_min() -> Self {
        SetGreedy { rule: Rule::MinMin, name: "minmin" }
    }
    pub fn max_min() -> Self {
        SetGreedy { rule: Rule::MaxMin, name: "maxmin" }
    }
    pub fn sufferage() -> Self {
        SetGreedy { rule: Rule::Sufferage, name: "sufferage" }
    }
}

fn ready_tasks(tasks: &[TaskCopy], mapped: &[bool], ext: &ScheduleExt) -> Vec<usize> {
    (0..tasks.len())
        .filter(|&i| !mapped[i] && ext.task_dep_satisfied(tasks[i].id))
        .collect()
}

impl MappingAlgorithm for SetGreedy {
    fn name(&self) -> &'static str {
        self.name
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
        tracing::info!(algorithm = self.name, task_count = tasks.len(), "mapping start");

        let mut schedule = Schedule::new(resources.clone(), tasks.clone());
        schedule.active_tasks = tasks.len();
        for (rix, r) in running.iter().enumerate() {
            schedule.running_tasks[rix] = r.as_ref().map(|t| t.id);
        }
        let mut ext = ScheduleExt::new(schedule);

        let mut mapped = vec![false; tasks.len()];
        let mut remaining = tasks.len();

        while remaining > 0 {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name, "interrupted");
                return None;
            }

            let ready = ready_tasks(&tasks, &mapped, &ext);
            if ready.is_empty() {
                // No ready task this round: either we're done or the
                // remaining tasks are blocked by out-of-scope state.
                break;
            }

            // completion time matrix restricted to ready tasks x compatible resources.
            let mut rows: Vec<(usize, Vec<(usize, f64)>)> = Vec::new();
            for &tix in &ready {
                let task = &tasks[tix];
                let mut row = Vec::new();
                for r in &resources {
                    if task.valid_resource(r.id) {
                        row.push((r.id, completion_time(&ext, task, r, estimator)));
                    }
                }
                rows.push((tix, row));
            }

            if matches!(self.rule, Rule::Sufferage) {
                // Each resource claims the still-unassigned task with the
                // largest sufferage among those that prefer it: one
                // assignment per resource per pass, all committed together
                // before the matrix is recomputed.
                let mut claims: BTreeMap<usize, (usize, f64, f64)> = BTreeMap::new(); // resource -> (task_ix, completion, sufferage)
                for (tix, row) in &rows {
                    if row.is_empty() {
                        continue;
                    }
                    let mut sorted: Vec<f64> = row.iter().map(|(_, c)| *c).collect();
                    sorted.sort_by(|a, b| a.total_cmp(b));
                    let min_c = sorted[0];
                    // Single compatible resource: no alternative to suffer
                    // from (see DESIGN.md Open Question 3).
                    let sufferage = if sorted.len() > 1 { sorted[1] - sorted[0] } else { 0.0 };
                    let Some(best_resource) = row.iter().min_by(|a, b| a.1.total_cmp(&b.1)).map(|(rid, _)| *rid)
                    else {
                        continue;
                    };
                    let better = claims.get(&best_resource).map(|(_, _, s)| sufferage > *s).unwrap_or(true);
                    if better {
                        claims.insert(best_resource, (*tix, min_c, sufferage));
                    }
                }

                if claims.is_empty() {
                    break;
                }
                for (resource_id, (tix, _, _)) in claims {
                    let task = &tasks[tix];
                    let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
                    ext.add_entry(entry, resource_id, None, estimator);
                    mapped[tix] = true;
                    remaining -= 1;
                }
                continue;
            }

            let chosen = match self.rule {
                Rule::MinMin => rows
                    .iter()
                    .filter_map(|(tix, row)| row.iter().min_by(|a, b| a.1.total_cmp(&b.1)).map(|(rid, c)| (*tix, *rid, *c)))
                    .min_by(|a, b| a.2.total_cmp(&b.2)),
                Rule::MaxMin => rows
                    .iter()
                    .filter_map(|(tix, row)| row.iter().min_by(|a, b| a.1.total_cmp(&b.1)).map(|(rid, c)| (*tix, *rid, *c)))
                    .max_by(|a, b| a.2.total_cmp(&b.2)),
                Rule::Sufferage => unreachable!("handled above"),
            };

            let Some((tix, resource_id, _)) = chosen else {
                break;
            };

            let task = &tasks[tix];
            if !task.valid_resource(resource_id) {
                // Degraded data: no feasible resource, record a large
                // penalty and drop the task from this round rather than loop.
                tracing::warn!(algorithm = self.name, task = task.id, penalty = DOUBLE_MAX, "infeasible placement");
                mapped[tix] = true;
                remaining -= 1;
                continue;
            }
            let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
            ext.add_entry(entry, resource_id, None, estimator);
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

    fn cost(init: f64, compute: f64, fini: f64) -> CostSample {
        CostSample { time_init: init, time_compute_full: compute, time_fini: fini, energy_compute_full: 0.0 }
    }

    #[test]
    fn s4_min_min_order_and_makespan() {
        // Three tasks, no deps, costs {0, c, 0} matrix [[4,2],[3,5],[8,6]] on {R0,R1}.
        let matrix = [[4.0, 2.0], [3.0, 5.0], [8.0, 6.0]];
        let mut tasks = Vec::new();
        for (i, row) in matrix.iter().enumerate() {
            let t = Task::new(i as u64, format!("t{i}"), 10)
                .with_compatible([0, 1])
                .with_cost("r0", cost(0.0, row[0], 0.0))
                .with_cost("r1", cost(0.0, row[1], 0.0));
            tasks.push(TaskCopy::of(&Arc::new(t)));
        }
        let resources = vec![Resource::new(0, "r0"), Resource::new(1, "r1")];
        let algo = SetGreedy::min_min();
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None, None], &interrupt, true, &est).unwrap();
        assert_eq!(sched.makespan, 8.0);
    }

    #[test]
    fn sufferage_single_resource_task_gets_zero_sufferage() {
        let t = Task::new(1, "t1", 10).with_compatible([0]).with_cost("r0", cost(0.0, 5.0, 0.0));
        let tasks = vec![TaskCopy::of(&Arc::new(t))];
        let resources = vec![Resource::new(0, "r0")];
        let algo = SetGreedy::sufferage();
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None], &interrupt, true, &est).unwrap();
        assert_eq!(sched.tasks_by_resource[0].len(), 1);
    }

    #[test]
    fn sufferage_commits_one_claim_per_resource_in_the_same_pass() {
        // T1 prefers r0 (2 < 9, sufferage 7); T2 prefers r1 (3 < 8,
        // sufferage 5). Disjoint best resources, so both claims should
        // land in the first pass rather than one per round.
        let t1 = Task::new(1, "t1", 10).with_compatible([0, 1]).with_cost("r0", cost(0.0, 2.0, 0.0)).with_cost(
            "r1",
            cost(0.0, 9.0, 0.0),
        );
        let t2 = Task::new(2, "t2", 10).with_compatible([0, 1]).with_cost("r0", cost(0.0, 8.0, 0.0)).with_cost(
            "r1",
            cost(0.0, 3.0, 0.0),
        );
        let tasks = vec![TaskCopy::of(&Arc::new(t1)), TaskCopy::of(&Arc::new(t2))];
        let resources = vec![Resource::new(0, "r0"), Resource::new(1, "r1")];
        let algo = SetGreedy::sufferage();
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None, None], &interrupt, true, &est).unwrap();
        assert_eq!(sched.tasks_by_resource[0].len(), 1);
        assert_eq!(sched.tasks_by_resource[0][0].time_finish, 2.0);
        assert_eq!(sched.tasks_by_resource[1].len(), 1);
        assert_eq!(sched.tasks_by_resource[1][0].time_finish, 3.0);
        assert_eq!(sched.makespan, 3.0);
    }

    #[test]
    fn sufferage_resolves_a_shared_best_resource_by_sufferage() {
        // Both T1 (suff 99) and T2 (suff 1) prefer r0 as their best
        // resource; only T1 claims r0 this pass. r1 is never anyone's
        // best, so T2 waits for the next pass rather than being diverted
        // to r1.
        let t1 = Task::new(1, "t1", 10)
            .with_compatible([0, 1])
            .with_cost("r0", cost(0.0, 1.0, 0.0))
            .with_cost("r1", cost(0.0, 100.0, 0.0));
        let t2 = Task::new(2, "t2", 10)
            .with_compatible([0, 1])
            .with_cost("r0", cost(0.0, 2.0, 0.0))
            .with_cost("r1", cost(0.0, 3.0, 0.0));
        let tasks = vec![TaskCopy::of(&Arc::new(t1)), TaskCopy::of(&Arc::new(t2))];
        let resources = vec![Resource::new(0, "r0"), Resource::new(1, "r1")];
        let algo = SetGreedy::sufferage();
        let est = LinearEstimator;
        let interrupt = AtomicBool::new(false);
        let sched = algo.compute(tasks, resources, vec![None, None], &interrupt, true, &est).unwrap();
        assert_eq!(sched.tasks_by_resource[1].len(), 0, "r1 is never anyone's best and stays empty");
        assert_eq!(sched.tasks_by_resource[0].len(), 2);
        assert_eq!(sched.tasks_by_resource[0][0].time_finish, 1.0);
        assert_eq!(sched.tasks_by_resource[0][1].time_finish, 3.0);
    }
}
