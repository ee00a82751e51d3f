/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task identity, DAG links, resource compatibility, progress and state.
//!
//! `Task` owns its shared arrays (predecessors, successors, compatible
//! resources, name, cost table). `TaskCopy` is the value-typed snapshot
//! mappers actually schedule: it shares those arrays via `Arc` rather than
//! duplicating them, and carries a back-reference to the original task so
//! a mapper can inspect live progress without holding a mutable borrow of
//! the whole task set.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

use crate::estimator::CostSample;
use crate::resource::ResourceId;

pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Pre,
    Starting,
    Running,
    Stopping,
    Suspended,
    Post,
    Aborted,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Pre
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TaskTimes {
    pub added: Option<SystemTime>,
    pub started: Option<SystemTime>,
    pub finished: Option<SystemTime>,
    pub aborted: Option<SystemTime>,
}

/// Per-(task, resource) cost samples, replacing the original's
/// `attributes["msresults"]` void-star table with a typed lookup.
pub type CostTable = std::collections::HashMap<String, CostSample>;

/// Shared, immutable-once-built task data. Owned by the caller for the
/// lifetime of a scheduling run; `TaskCopy`s hold `Arc` handles into it.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub size: u64,
    pub checkpoints: u32,
    pub progress: u32,
    pub state: TaskState,
    pub times: TaskTimes,
    pub predecessors: Vec<TaskId>,
    pub successors: Vec<TaskId>,
    pub compatible_resources: BTreeSet<ResourceId>,
    pub cost_table: CostTable,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, checkpoints: u32) -> Self {
        assert!(checkpoints > 0, "checkpoints must be > 0");
        Task {
            id,
            name: name.into(),
            size: 0,
            checkpoints,
            progress: 0,
            state: TaskState::Pre,
            times: TaskTimes::default(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            compatible_resources: BTreeSet::new(),
            cost_table: CostTable::new(),
        }
    }

    pub fn with_compatible(mut self, resources: impl IntoIterator<Item = ResourceId>) -> Self {
        self.compatible_resources.extend(resources);
        self
    }

    pub fn with_predecessor(mut self, id: TaskId) -> Self {
        self.predecessors.push(id);
        self
    }

    pub fn with_successor(mut self, id: TaskId) -> Self {
        self.successors.push(id);
        self
    }

    pub fn with_cost(mut self, resource_name: impl Into<String>, sample: CostSample) -> Self {
        self.cost_table.insert(resource_name.into(), sample);
        self
    }

    pub fn valid_resource(&self, resource: ResourceId) -> bool {
        self.compatible_resources.contains(&resource)
    }
}

/// A value-typed snapshot of a `Task` used by mappers. Does not own the
/// shared arrays of the original; `original` is the only owning handle.
#[derive(Debug, Clone)]
pub struct TaskCopy {
    pub original: Arc<Task>,
    pub id: TaskId,
    pub progress: u32,
    pub checkpoints: u32,
    pub state: TaskState,
}

impl TaskCopy {
    pub fn of(task: &Arc<Task>) -> Self {
        TaskCopy {
            original: Arc::clone(task),
            id: task.id,
            progress: task.progress,
            checkpoints: task.checkpoints,
            state: task.state,
        }
    }

    pub fn valid_resource(&self, resource: ResourceId) -> bool {
        self.original.valid_resource(resource)
    }

    pub fn predecessors(&self) -> &[TaskId] {
        &self.original.predecessors
    }

    pub fn successors(&self) -> &[TaskId] {
        &self.original.successors
    }

    pub fn compatible_resources(&self) -> &BTreeSet<ResourceId> {
        &self.original.compatible_resources
    }

    pub fn name(&self) -> &str {
        &self.original.name
    }

    /// Current, authoritative progress read directly from the live task
    /// (used when the caller's `progress_updated` flag is set).
    pub fn live_progress(&self) -> u32 {
        self.original.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_resource_checks_membership() {
        let t = Task::new(1, "t1", 10).with_compatible([0, 2]);
        assert!(t.valid_resource(0));
        assert!(!t.valid_resource(1));
        assert!(t.valid_resource(2));
    }

    #[test]
    fn checkpoints_must_be_positive() {
        let result = std::panic::catch_unwind(|| Task::new(1, "t", 0));
        assert!(result.is_err());
    }

    #[test]
    fn task_copy_shares_arrays_via_arc() {
        let task = Arc::new(Task::new(5, "t5", 4).with_compatible([1]));
        let copy_a = TaskCopy::of(&task);
        let copy_b = TaskCopy::of(&task);
        assert!(Arc::ptr_eq(&copy_a.original, &copy_b.original));
        assert_eq!(copy_a.compatible_resources(), copy_b.compatible_resources());
    }

    #[test]
    fn task_copy_tracks_progress_at_snapshot_time() {
        let mut task = Task::new(1, "t", 10);
        task.progress = 3;
        let task = Arc::new(task);
        let copy = TaskCopy::of(&task);
        assert_eq!(copy.progress, 3);
        assert_eq!(copy.live_progress(), 3);
    }

    #[test]
    fn default_state_is_pre() {
        assert_eq!(TaskState::default(), TaskState::Pre);
    }
}
