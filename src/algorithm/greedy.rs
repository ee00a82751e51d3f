/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-task greedy mappers: MCT, MET, OLB, SA (switching-adaptive), KPB
//! (k-percent-best). Each visits tasks in topological order and, for each
//! one, picks a single compatible resource by a different rule.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{KpbConfig, SaConfig};
use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::schedule::ext::ScheduleExt;
use crate::schedule::Schedule;
use crate::task::TaskCopy;

use super::common::{completion_time, compatible_resources, execution_time, topo_order};
use super::MappingAlgorithm;

#[derive(Debug, Clone, Copy)]
enum Rule {
    Mct,
    Met,
    Olb,
    SwitchingAdaptive { ratio_lower: f64, ratio_higher: f64 },
    Kpb { percentage: f64 },
}

/// SA's current regime. Only crossing `ratio_higher`/`ratio_lower` changes
/// it; inside the band it carries over from the previous task's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaMode {
    Mct,
    Met,
}

pub struct PerTaskGreedy {
    rule: Rule,
    name: &'static str,
    sa_mode: Cell<SaMode>,
}

impl PerTaskGreedy {
    pub fn mct() -> Self {
        PerTaskGreedy { rule: Rule::Mct, name: "mct", sa_mode: Cell::new(SaMode::Mct) }
    }
    pub fn met() -> Self {
        PerTaskGreedy { rule: Rule::Met, name: "met", sa_mode: Cell::new(SaMode::Mct) }
    }
    pub fn olb() -> Self {
        PerTaskGreedy { rule: Rule::Olb, name: "olb", sa_mode: Cell::new(SaMode::Mct) }
    }
    pub fn switching_adaptive(cfg: Option<&SaConfig>) -> Self {
        let cfg = cfg.cloned().unwrap_or_default();
        PerTaskGreedy {
            rule: Rule::SwitchingAdaptive { ratio_lower: cfg.ratio_lower, ratio_higher: cfg.ratio_higher },
            name: "sa",
            sa_mode: Cell::new(SaMode::Mct),
        }
    }
    pub fn kpb(cfg: Option<&KpbConfig>) -> Self {
        let cfg = cfg.cloned().unwrap_or_default();
        PerTaskGreedy { rule: Rule::Kpb { percentage: cfg.percentage }, name: "kpb", sa_mode: Cell::new(SaMode::Mct) }
    }

    fn pick_resource<E: Estimator>(
        &self,
        ext: &ScheduleExt,
        task: &TaskCopy,
        resources: &[Resource],
        estimator: &E,
    ) -> Option<usize> {
        let candidates = compatible_resources(task, resources);
        if candidates.is_empty() {
            return None;
        }

        match self.rule {
            Rule::Mct => candidates
                .iter()
                .map(|r| (r.id, completion_time(ext, task, r, estimator)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id),
            Rule::Met => candidates
                .iter()
                .map(|r| (r.id, execution_time(task, r, estimator)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id),
            Rule::Olb => candidates
                .iter()
                .map(|r| {
                    let resource_ready = ext.resource_ready_time(r.id);
                    let task_ready = ext.task_ready_time_resource(task.id, r.id, estimator);
                    (r.id, resource_ready.max(task_ready))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id),
            Rule::SwitchingAdaptive { ratio_lower, ratio_higher } => {
                let readies: Vec<f64> = candidates.iter().map(|r| ext.resource_ready_time(r.id)).collect();
                let min_ready = readies.iter().cloned().fold(f64::INFINITY, f64::min);
                let max_ready = readies.iter().cloned().fold(0.0, f64::max);
                let ratio = if max_ready > 0.0 { min_ready / max_ready } else { 1.0 };
                // Mode only flips on a threshold crossing; inside the band
                // it carries over from the previous task's decision.
                if ratio >= ratio_higher {
                    self.sa_mode.set(SaMode::Met);
                } else if ratio <= ratio_lower {
                    self.sa_mode.set(SaMode::Mct);
                }
                match self.sa_mode.get() {
                    SaMode::Met => candidates
                        .iter()
                        .map(|r| (r.id, execution_time(task, r, estimator)))
                        .min_by(|a, b| a.1.total_cmp(&b.1))
                        .map(|(id, _)| id),
                    SaMode::Mct => candidates
                        .iter()
                        .map(|r| (r.id, completion_time(ext, task, r, estimator)))
                        .min_by(|a, b| a.1.total_cmp(&b.1))
                        .map(|(id, _)| id),
                }
            }
            Rule::Kpb { percentage } => {
                let mut by_exec: Vec<(usize, f64)> =
                    candidates.iter().map(|r| (r.id, execution_time(task, r, estimator))).collect();
                by_exec.sort_by(|a, b| a.1.total_cmp(&b.1));
                let take = ((percentage / 100.0) * by_exec.len() as f64).ceil().max(1.0) as usize;
                by_exec
                    .into_iter()
                    .take(take)
                    .map(|(id, _)| {
                        let r = resources.iter().find(|r| r.id == id).unwrap();
                        (id, completion_time(ext, task, r, estimator))
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(id, _)| id)
            }
        }
    }
}

impl MappingAlgorithm for PerTaskGreedy {
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

        let order = topo_order(&tasks);
        let mut schedule = Schedule::new(resources.clone(), tasks.clone());
        schedule.active_tasks = tasks.len();
        for (rix, r) in running.iter().enumerate() {
            schedule.running_tasks[rix] = r.as_ref().map(|t| t.id);
        }
        let mut ext = ScheduleExt::new(schedule);

        for &ix in &order {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name, "interrupted");
                return None;
            }
            let task = &tasks[ix];
            let Some(resource_id) = self.pick_resource(&ext, task, &resources, estimator) else {
                tracing::warn!(algorithm = self.name, task = task.id, "no compatible resource");
                continue;
            };
            let entry = crate::schedule::TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
            ext.add_entry(entry, resource_id, None, estimator);
        }

        Some(ext.into_schedule())
    }
}
