/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-(task, resource) cost estimation.
//!
//! `Estimator` is the only consumer of cost data in the core; loaders
//! populate a concrete `CostTable` (see [`crate::task::CostTable`]) that
//! callers pass in explicitly, rather than a generic attribute map.

pub mod loader;

use crate::resource::Resource;
use crate::task::Task;

/// Raw per-(task,resource) sample, one row of the original's
/// `msresults` table: total init/compute/fini time (seconds) and the
/// matching energy figures (joules) for a full run of the task.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostSample {
    pub time_init: f64,
    pub time_compute_full: f64,
    pub time_fini: f64,
    pub energy_compute_full: f64,
}

/// Pure, deterministic time/energy model consumed by every mapper.
pub trait Estimator {
    fn time_init(&self, task: &Task, resource: &Resource) -> f64;
    fn time_compute(&self, task: &Task, resource: &Resource, start_cp: u32, stop_cp: u32) -> f64;
    fn time_fini(&self, task: &Task, resource: &Resource) -> f64;

    /// Largest number of checkpoints whose compute time fits in
    /// `budget_seconds`, starting from `start_cp`. `0` if the budget is
    /// non-positive or the pair is incompatible.
    fn time_compute_checkpoint(
        &self,
        task: &Task,
        resource: &Resource,
        start_cp: u32,
        budget_seconds: f64,
    ) -> u32;

    fn energy_init(&self, task: &Task, resource: &Resource) -> f64;
    fn energy_compute(&self, task: &Task, resource: &Resource, start_cp: u32, stop_cp: u32) -> f64;
    fn energy_fini(&self, task: &Task, resource: &Resource) -> f64;

    fn energy_compute_checkpoint(
        &self,
        task: &Task,
        resource: &Resource,
        start_cp: u32,
        energy_budget: f64,
    ) -> u32;

    fn resource_idle_power(&self, resource: &Resource) -> f64 {
        resource.idle_power
    }

    fn resource_idle_energy(&self, resource: &Resource, seconds: f64) -> f64 {
        resource.idle_energy(seconds)
    }
}

/// Reference estimator: costs are linear in checkpoint span, drawn from
/// each task's cost table keyed by resource name. Missing data yields 0,
/// matching the contract on incompatibility.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearEstimator;

impl LinearEstimator {
    fn sample<'a>(&self, task: &'a Task, resource: &Resource) -> Option<&'a CostSample> {
        if !task.valid_resource(resource.id) {
            return None;
        }
        task.cost_table.get(&resource.name)
    }
}

impl Estimator for LinearEstimator {
    fn time_init(&self, task: &Task, resource: &Resource) -> f64 {
        self.sample(task, resource).map(|s| s.time_init).unwrap_or(0.0)
    }

    fn time_compute(&self, task: &Task, resource: &Resource, start_cp: u32, stop_cp: u32) -> f64 {
        match self.sample(task, resource) {
            Some(s) => (s.time_compute_full / task.checkpoints as f64) * (stop_cp as f64 - start_cp as f64),
            None => 0.0,
        }
    }

    fn time_fini(&self, task: &Task, resource: &Resource) -> f64 {
        self.sample(task, resource).map(|s| s.time_fini).unwrap_or(0.0)
    }

    fn time_compute_checkpoint(
        &self,
        task: &Task,
        resource: &Resource,
        _start_cp: u32,
        budget_seconds: f64,
    ) -> u32 {
        if budget_seconds <= 0.0 {
            return 0;
        }
        match self.sample(task, resource) {
            Some(s) if s.time_compute_full > 0.0 => {
                let per_checkpoint = s.time_compute_full / task.checkpoints as f64;
                if per_checkpoint <= 0.0 {
                    0
                } else {
                    (budget_seconds / per_checkpoint) as u32
                }
            }
            _ => 0,
        }
    }

    fn energy_init(&self, _task: &Task, _resource: &Resource) -> f64 {
        // matches the original reference estimator: init/fini energy is untracked
        0.0
    }

    fn energy_compute(&self, task: &Task, resource: &Resource, start_cp: u32, stop_cp: u32) -> f64 {
        match self.sample(task, resource) {
            Some(s) => (s.energy_compute_full / task.checkpoints as f64) * (stop_cp as f64 - start_cp as f64),
            None => 0.0,
        }
    }

    fn energy_fini(&self, _task: &Task, _resource: &Resource) -> f64 {
        0.0
    }

    fn energy_compute_checkpoint(
        &self,
        task: &Task,
        resource: &Resource,
        _start_cp: u32,
        energy_budget: f64,
    ) -> u32 {
        if energy_budget <= 0.0 {
            return 0;
        }
        match self.sample(task, resource) {
            Some(s) if s.energy_compute_full > 0.0 => {
                let per_checkpoint = s.energy_compute_full / task.checkpoints as f64;
                if per_checkpoint <= 0.0 {
                    0
                } else {
                    (energy_budget / per_checkpoint) as u32
                }
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn task_with_cost() -> Task {
        Task::new(1, "t1", 10)
            .with_compatible([0])
            .with_cost(
                "r0",
                CostSample { time_init: 1.0, time_compute_full: 10.0, time_fini: 1.0, energy_compute_full: 5.0 },
            )
    }

    #[test]
    fn linear_time_scales_with_checkpoint_span() {
        let task = task_with_cost();
        let res = Resource::new(0, "r0");
        let est = LinearEstimator;
        assert_eq!(est.time_init(&task, &res), 1.0);
        assert_eq!(est.time_compute(&task, &res, 0, 10), 10.0);
        assert_eq!(est.time_compute(&task, &res, 0, 5), 5.0);
        assert_eq!(est.time_fini(&task, &res), 1.0);
    }

    #[test]
    fn incompatible_resource_yields_zero() {
        let task = task_with_cost();
        let other = Resource::new(1, "r1");
        let est = LinearEstimator;
        assert_eq!(est.time_init(&task, &other), 0.0);
        assert_eq!(est.time_compute(&task, &other, 0, 10), 0.0);
    }

    #[test]
    fn energy_init_and_fini_are_untracked() {
        let task = task_with_cost();
        let res = Resource::new(0, "r0");
        let est = LinearEstimator;
        assert_eq!(est.energy_init(&task, &res), 0.0);
        assert_eq!(est.energy_fini(&task, &res), 0.0);
        assert_eq!(est.energy_compute(&task, &res, 0, 10), 5.0);
    }

    #[test]
    fn time_compute_checkpoint_is_inverse_of_compute() {
        let task = task_with_cost();
        let res = Resource::new(0, "r0");
        let est = LinearEstimator;
        // 1 second per checkpoint -> 6 second budget fits 6 checkpoints
        assert_eq!(est.time_compute_checkpoint(&task, &res, 0, 6.0), 6);
        assert_eq!(est.time_compute_checkpoint(&task, &res, 0, 0.0), 0);
        assert_eq!(est.time_compute_checkpoint(&task, &res, 0, -1.0), 0);
    }

    #[test]
    fn resource_idle_energy_delegates_to_resource() {
        let res = Resource::new(0, "r0").with_idle_power(2.0);
        let est = LinearEstimator;
        assert_eq!(est.resource_idle_energy(&res, 3.0), 6.0);
        assert_eq!(est.resource_idle_power(&res), 2.0);
    }
}
