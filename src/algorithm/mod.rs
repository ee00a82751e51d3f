/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The mapping-algorithm family: a shared `compute` contract plus a
//! tagged-variant dispatch (`AlgorithmKind`) and a name-keyed
//! `AlgorithmRegistry`, per the Design Notes' "algorithms are thin
//! policies over ScheduleExt" guidance.

pub mod common;
pub mod genetic;
pub mod greedy;
pub mod heft;
pub mod reminmin;
pub mod set_greedy;
pub mod simulated_annealing;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::AlgorithmConfig;
use crate::error::{Result, SchedError};
use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::task::TaskCopy;

use crate::schedule::Schedule;

/// Shared contract implemented by every mapper.
///
/// `running` gives, per resource, the task currently occupying it (if
/// any) — used by migration-aware variants and by `ScheduleExt`'s
/// ready-time helpers. `interrupt` is polled at loop boundaries by
/// long-running mappers (genetic, simulated annealing); when it fires
/// the mapper returns `None`, meaning "no result, the caller keeps the
/// previous schedule".
pub trait MappingAlgorithm {
    fn name(&self) -> &'static str;

    fn compute<E: Estimator>(
        &self,
        tasks: Vec<TaskCopy>,
        resources: Vec<Resource>,
        running: Vec<Option<TaskCopy>>,
        interrupt: &AtomicBool,
        progress_updated: bool,
        estimator: &E,
    ) -> Option<Schedule>;
}

/// Object-safe wrapper so the registry can hold heterogeneous mappers
/// behind one trait object, fixed to the `LinearEstimator` (the only
/// estimator this crate ships) to keep the registry dynamically
/// dispatchable.
pub trait DynMappingAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn compute_dyn(
        &self,
        tasks: Vec<TaskCopy>,
        resources: Vec<Resource>,
        running: Vec<Option<TaskCopy>>,
        interrupt: &AtomicBool,
        progress_updated: bool,
    ) -> Option<Schedule>;
}

impl<T> DynMappingAlgorithm for T
where
    T: MappingAlgorithm + Send + Sync,
{
    fn name(&self) -> &'static str {
        MappingAlgorithm::name(self)
    }

    fn compute_dyn(
        &self,
        tasks: Vec<TaskCopy>,
        resources: Vec<Resource>,
        running: Vec<Option<TaskCopy>>,
        interrupt: &AtomicBool,
        progress_updated: bool,
    ) -> Option<Schedule> {
        let est = crate::estimator::LinearEstimator;
        self.compute(tasks, resources, running, interrupt, progress_updated, &est)
    }
}

/// String -> mapper constructor dispatch, keyed by the names used in
/// configuration (`mct`, `met`, `olb`, `sa`, `kpb`, `minmin`, `maxmin`,
/// `sufferage`, `heft`, `heftmig`, `genetic`, `geneticmig`,
/// `geneticmig_energy`, `simann`, `reminmin`, `reminminmig`).
pub struct AlgorithmRegistry {
    algorithms: std::collections::BTreeMap<String, Arc<dyn DynMappingAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        AlgorithmRegistry { algorithms: std::collections::BTreeMap::new() }
    }

    /// Builds the registry with every algorithm named in `configs`
    /// constructed from its matching config block (falling back to
    /// defaults for any algorithm not present in `configs`).
    pub fn with_defaults(configs: &std::collections::BTreeMap<String, AlgorithmConfig>) -> Self {
        let mut reg = AlgorithmRegistry::new();
        reg.register("mct", Arc::new(greedy::PerTaskGreedy::mct()));
        reg.register("met", Arc::new(greedy::PerTaskGreedy::met()));
        reg.register("olb", Arc::new(greedy::PerTaskGreedy::olb()));
        reg.register(
            "sa",
            Arc::new(greedy::PerTaskGreedy::switching_adaptive(configs.get("sa").and_then(|c| c.as_sa()))),
        );
        reg.register("kpb", Arc::new(greedy::PerTaskGreedy::kpb(configs.get("kpb").and_then(|c| c.as_kpb()))));
        reg.register("minmin", Arc::new(set_greedy::SetGreedy::min_min()));
        reg.register("maxmin", Arc::new(set_greedy::SetGreedy::max_min()));
        reg.register("sufferage", Arc::new(set_greedy::SetGreedy::sufferage()));
        reg.register("heft", Arc::new(heft::Heft::new(false)));
        reg.register("heftmig", Arc::new(heft::Heft::new(true)));
        reg.register("reminmin", Arc::new(reminmin::ReMinMin::new(false)));
        reg.register("reminminmig", Arc::new(reminmin::ReMinMin::new(true)));
        reg.register(
            "genetic",
            Arc::new(genetic::Genetic::new(false, genetic::Objective::Makespan, configs.get("genetic").and_then(|c| c.as_genetic()))),
        );
        reg.register(
            "geneticmig",
            Arc::new(genetic::Genetic::new(true, genetic::Objective::Makespan, configs.get("genetic").and_then(|c| c.as_genetic()))),
        );
        reg.register(
            "geneticmig_energy",
            Arc::new(genetic::Genetic::new(true, genetic::Objective::Energy, configs.get("genetic").and_then(|c| c.as_genetic()))),
        );
        reg.register(
            "simann",
            Arc::new(simulated_annealing::SimulatedAnnealing::new(
                configs.get("simulated_annealing").and_then(|c| c.as_simann()),
            )),
        );
        reg
    }

    pub fn register(&mut self, name: &str, algorithm: Arc<dyn DynMappingAlgorithm>) {
        self.algorithms.insert(name.to_string(), algorithm);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn DynMappingAlgorithm>> {
        self.algorithms.get(name).cloned().ok_or_else(|| SchedError::UnknownAlgorithm(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.algorithms.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_every_documented_algorithm_name() {
        let configs = std::collections::BTreeMap::new();
        let reg = AlgorithmRegistry::with_defaults(&configs);
        for name in [
            "mct",
            "met",
            "olb",
            "sa",
            "kpb",
            "minmin",
            "maxmin",
            "sufferage",
            "heft",
            "heftmig",
            "genetic",
            "geneticmig",
            "geneticmig_energy",
            "simann",
            "reminmin",
            "reminminmig",
        ] {
            assert!(reg.get(name).is_ok(), "missing algorithm {name}");
        }
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let configs = std::collections::BTreeMap::new();
        let reg = AlgorithmRegistry::with_defaults(&configs);
        assert!(reg.get("not-a-real-algorithm").is_err());
    }
}
