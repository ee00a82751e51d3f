/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Helpers shared by several algorithm families: topological ordering and
//! completion-time computation.

use crate::estimator::Estimator;
use crate::resource::{Resource, ResourceId};
use crate::schedule::ext::ScheduleExt;
use crate::task::TaskCopy;

/// Stable Kahn's-algorithm topological sort restricted to the given task
/// set (predecessors/successors outside it are ignored, as "in scope"
/// means "present in this call's task list" throughout the core).
pub fn topo_order(tasks: &[TaskCopy]) -> Vec<usize> {
    use std::collections::{HashMap, VecDeque};

    let index_of: HashMap<u64, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut indeg = vec![0usize; tasks.len()];
    for (i, t) in tasks.iter().enumerate() {
        indeg[i] = t.predecessors().iter().filter(|p| index_of.contains_key(p)).count();
    }

    let mut queue: VecDeque<usize> = (0..tasks.len()).filter(|&i| indeg[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for succ in tasks[i].successors() {
            if let Some(&j) = index_of.get(succ) {
                indeg[j] -= 1;
                if indeg[j] == 0 {
                    queue.push_back(j);
                }
            }
        }
    }
    // Any remaining tasks (a cycle, which violates the DAG contract) are
    // appended in input order rather than silently dropped.
    if order.len() < tasks.len() {
        for i in 0..tasks.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }
    }
    order
}

/// Completion time of `task` on `resource` if placed right now:
/// `max(resource_ready, task_ready) + init + compute + fini`.
pub fn completion_time<E: Estimator>(
    ext: &ScheduleExt,
    task: &TaskCopy,
    resource: &Resource,
    estimator: &E,
) -> f64 {
    let resource_ready = ext.resource_ready_time(resource.id);
    let task_ready = ext.task_ready_time_resource(task.id, resource.id, estimator);
    let ready = resource_ready.max(task_ready);
    let duration = estimator.time_init(&task.original, resource)
        + estimator.time_compute(&task.original, resource, task.progress, task.checkpoints)
        + estimator.time_fini(&task.original, resource);
    ready + duration
}

pub fn execution_time<E: Estimator>(task: &TaskCopy, resource: &Resource, estimator: &E) -> f64 {
    estimator.time_init(&task.original, resource)
        + estimator.time_compute(&task.original, resource, task.progress, task.checkpoints)
        + estimator.time_fini(&task.original, resource)
}

pub fn compatible_resources<'a>(task: &TaskCopy, resources: &'a [Resource]) -> Vec<&'a Resource> {
    resources.iter().filter(|r| task.valid_resource(r.id)).collect()
}

pub type DoubleMax = f64;
pub const DOUBLE_MAX: DoubleMax = 1e10;

pub fn resource_id_list(resources: &[Resource]) -> Vec<ResourceId> {
    resources.iter().map(|r| r.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use std::sync::Arc;

    #[test]
    fn topo_order_respects_dependencies() {
        let t1 = Task::new(1, "t1", 10).with_successor(3);
        let t2 = Task::new(2, "t2", 10).with_successor(3);
        let t3 = Task::new(3, "t3", 10).with_predecessor(1).with_predecessor(2);
        let tasks = vec![
            TaskCopy::of(&Arc::new(t1)),
            TaskCopy::of(&Arc::new(t2)),
            TaskCopy::of(&Arc::new(t3)),
        ];
        let order = topo_order(&tasks);
        let pos_of = |id: u64| order.iter().position(|&i| tasks[i].id == id).unwrap();
        assert!(pos_of(1) < pos_of(3));
        assert!(pos_of(2) < pos_of(3));
    }
}
