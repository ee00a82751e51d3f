/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule introspection output: a plain-data mirror of [`super::Schedule`]
//! matching the documented JSON shape exactly, independent of the
//! internal `Arc<Task>`-bearing representation.

use serde::Serialize;

use super::{EntryState, Schedule};
use crate::task::TaskState;

#[derive(Debug, Serialize)]
pub struct TaskEntryJson {
    pub id: u64,
    pub part: u32,
    pub start_progress: u32,
    pub stop_progress: u32,
    pub current_progress: u32,
    pub current_state: TaskState,
    pub duration_total: f64,
    pub time_ready: f64,
    pub time_finish: f64,
    pub duration_init: f64,
    pub duration_compute: f64,
    pub duration_fini: f64,
    pub duration_break: f64,
    pub energy: f64,
}

#[derive(Debug, Serialize)]
pub struct ScheduleJson {
    pub id: u64,
    pub compute_start: u64,
    pub compute_stop: u64,
    pub compute_duration: u64,
    pub duration: f64,
    pub active_tasks: usize,
    pub static_energy: f64,
    pub dynamic_energy: f64,
    pub total_energy: f64,
    pub tasks: Vec<Vec<TaskEntryJson>>,
}

impl From<&Schedule> for ScheduleJson {
    fn from(sched: &Schedule) -> Self {
        let tasks = sched
            .tasks_by_resource
            .iter()
            .map(|queue| {
                queue
                    .iter()
                    .map(|e| TaskEntryJson {
                        id: e.task_id,
                        part: e.part_number,
                        start_progress: e.start_progress,
                        stop_progress: e.stop_progress,
                        current_progress: e.task.progress,
                        current_state: if e.state == EntryState::Aborted {
                            TaskState::Aborted
                        } else {
                            e.task.state
                        },
                        duration_total: e.dur_total,
                        time_ready: e.time_ready,
                        time_finish: e.time_finish,
                        duration_init: e.dur_init,
                        duration_compute: e.dur_compute,
                        duration_fini: e.dur_fini,
                        duration_break: e.dur_break,
                        energy: e.energy,
                    })
                    .collect()
            })
            .collect();

        ScheduleJson {
            id: sched.id,
            compute_start: sched.compute_start_ns,
            compute_stop: sched.compute_stop_ns,
            compute_duration: sched.compute_stop_ns.saturating_sub(sched.compute_start_ns),
            duration: sched.makespan,
            active_tasks: sched.active_tasks,
            static_energy: sched.static_energy,
            dynamic_energy: sched.dynamic_energy,
            total_energy: sched.total_energy,
            tasks,
        }
    }
}

impl Schedule {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ScheduleJson::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::LinearEstimator;
    use crate::resource::Resource;
    use crate::task::{Task, TaskCopy};
    use std::sync::Arc;

    #[test]
    fn json_roundtrip_has_expected_top_level_keys() {
        let t1 = Arc::new(Task::new(1, "t1", 10).with_compatible([0]));
        let res = vec![Resource::new(0, "r0")];
        let copies = vec![TaskCopy::of(&t1)];
        let mut sched = Schedule::new(res.clone(), copies);
        let mut entry = super::super::TaskEntry::new(t1.clone(), 0, 10);
        entry.compute_execution_time(&res[0], &LinearEstimator, false);
        sched.tasks_by_resource[0].push(entry);
        sched.compute_times();

        let json = sched.to_json_string().unwrap();
        assert!(json.contains("\"active_tasks\""));
        assert!(json.contains("\"tasks\""));
        assert!(json.contains("\"static_energy\""));
    }
}
