/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Genetic mapper: height-partitioned chromosomes, roulette selection,
//! height-bounded crossover, equal-height swap mutation. The migration
//! variant delegates fitness evaluation to [`crate::migration`].

use std::sync::atomic::{AtomicBool, Ordering};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GeneticConfig;
use crate::estimator::Estimator;
use crate::migration::{MigrationPlanner, ReferenceSolver};
use crate::resource::Resource;
use crate::schedule::ext::ScheduleExt;
use crate::schedule::{Schedule, TaskEntry};
use crate::task::TaskCopy;

use super::common::{compatible_resources, execution_time, DOUBLE_MAX};
use super::MappingAlgorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Makespan,
    Energy,
}

/// One chromosome: per-resource ordered lists of task indices.
#[derive(Debug, Clone)]
pub(crate) struct Chromosome {
    /// `per_resource[r]` is the ordered list of task indices placed there.
    pub(crate) per_resource: Vec<Vec<usize>>,
    pub(crate) fitness: f64,
}

pub(crate) fn heights(tasks: &[TaskCopy]) -> Vec<u32> {
    use std::collections::HashMap;
    let index: HashMap<u64, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut height = vec![0u32; tasks.len()];
    let order = super::common::topo_order(tasks);
    for &ix in &order {
        let h = tasks[ix]
            .predecessors()
            .iter()
            .filter_map(|p| index.get(p))
            .map(|&pix| height[pix] + 1)
            .max()
            .unwrap_or(0);
        height[ix] = h;
    }
    height
}

pub(crate) fn random_chromosome(tasks: &[TaskCopy], resources: &[Resource], heights: &[u32], rng: &mut impl Rng) -> Chromosome {
    let mut per_resource = vec![Vec::new(); resources.len()];
    let max_height = heights.iter().copied().max().unwrap_or(0);
    for h in 0..=max_height {
        for (tix, task) in tasks.iter().enumerate() {
            if heights[tix] != h {
                continue;
            }
            let candidates = compatible_resources(task, resources);
            let chosen = if candidates.is_empty() {
                0
            } else {
                candidates.choose(rng).map(|r| r.id).unwrap_or(0)
            };
            per_resource[chosen].push(tix);
        }
    }
    Chromosome { per_resource, fitness: DOUBLE_MAX }
}

pub(crate) fn evaluate_fitness<E: Estimator>(
    chromo: &Chromosome,
    tasks: &[TaskCopy],
    resources: &[Resource],
    objective: Objective,
    estimator: &E,
) -> f64 {
    let mut resource_finish = vec![0.0f64; resources.len()];
    let mut dynamic_energy = 0.0f64;
    let mut penalty = 0.0f64;

    // Simulate in height order across all resources together so
    // dependency finish times are available when a task's turn comes.
    let h = heights(tasks);
    let max_height = h.iter().copied().max().unwrap_or(0);
    let mut finish_of: std::collections::HashMap<u64, f64> = std::collections::HashMap::new();

    for height in 0..=max_height {
        for (rix, resource) in resources.iter().enumerate() {
            for &tix in &chromo.per_resource[rix] {
                if h[tix] != height {
                    continue;
                }
                let task = &tasks[tix];
                if !task.valid_resource(resource.id) {
                    penalty += DOUBLE_MAX;
                    continue;
                }
                let dep_ready = task
                    .predecessors()
                    .iter()
                    .filter_map(|p| finish_of.get(p))
                    .cloned()
                    .fold(0.0, f64::max);
                let ready = resource_finish[rix].max(dep_ready);
                let duration = execution_time(task, resource, estimator);
                let finish = ready + duration;
                resource_finish[rix] = finish;
                finish_of.insert(task.id, finish);
                dynamic_energy += estimator.energy_init(&task.original, resource)
                    + estimator.energy_compute(&task.original, resource, task.progress, task.checkpoints)
                    + estimator.energy_fini(&task.original, resource);
            }
        }
    }

    if penalty > 0.0 {
        return penalty;
    }

    let makespan = resource_finish.iter().cloned().fold(0.0, f64::max);
    match objective {
        Objective::Makespan => makespan,
        Objective::Energy => {
            let static_energy: f64 =
                resources.iter().zip(resource_finish.iter()).map(|(r, &f)| r.idle_energy(f)).sum();
            static_energy + dynamic_energy
        }
    }
}

fn crossover(a: &Chromosome, b: &Chromosome, cut_height: u32, heights: &[u32]) -> (Chromosome, Chromosome) {
    let mut child_a = a.clone();
    let mut child_b = b.clone();
    for r in 0..a.per_resource.len() {
        let split = |seq: &[usize]| -> usize {
            seq.iter().position(|&tix| heights[tix] > cut_height).unwrap_or(seq.len())
        };
        let sa = split(&a.per_resource[r]);
        let sb = split(&b.per_resource[r]);
        let mut new_a = a.per_resource[r][..sa].to_vec();
        new_a.extend_from_slice(&b.per_resource[r][sb..]);
        let mut new_b = b.per_resource[r][..sb].to_vec();
        new_b.extend_from_slice(&a.per_resource[r][sa..]);
        child_a.per_resource[r] = new_a;
        child_b.per_resource[r] = new_b;
    }
    (child_a, child_b)
}

pub(crate) fn mutate(chromo: &mut Chromosome, heights: &[u32], rng: &mut impl Rng) {
    if chromo.per_resource.len() < 2 {
        return;
    }
    let candidates: Vec<(usize, usize)> = chromo
        .per_resource
        .iter()
        .enumerate()
        .flat_map(|(r, seq)| seq.iter().enumerate().map(move |(i, _)| (r, i)))
        .collect();
    if candidates.len() < 2 {
        return;
    }
    let (r1, i1) = candidates[rng.gen_range(0..candidates.len())];
    let same_height: Vec<(usize, usize)> = candidates
        .iter()
        .filter(|&&(r2, i2)| (r2, i2) != (r1, i1) && heights[chromo.per_resource[r2][i2]] == heights[chromo.per_resource[r1][i1]])
        .cloned()
        .collect();
    if let Some(&(r2, i2)) = same_height.choose(rng) {
        let tmp = chromo.per_resource[r1][i1];
        chromo.per_resource[r1][i1] = chromo.per_resource[r2][i2];
        chromo.per_resource[r2][i2] = tmp;
    }
}

const POPULATION: usize = 20;
const MAX_NOCHANGE: u32 = 10;

pub struct Genetic {
    migration: bool,
    objective: Objective,
    seed: u64,
    population: usize,
    max_nochange: u32,
}

impl Genetic {
    pub fn new(migration: bool, objective: Objective, cfg: Option<&GeneticConfig>) -> Self {
        let cfg = cfg.cloned().unwrap_or_default();
        Genetic {
            migration,
            objective,
            seed: cfg.seed,
            population: if cfg.population > 0 { cfg.population } else { POPULATION },
            max_nochange: if cfg.max_nochange > 0 { cfg.max_nochange } else { MAX_NOCHANGE },
        }
    }

}

/// Realises a chromosome's per-resource assignment as a concrete
/// `Schedule`, inserting entries in height order so dependencies are
/// already placed by the time a successor is reached.
pub(crate) fn chromosome_to_schedule<E: Estimator>(
    chromo: &Chromosome,
    tasks: &[TaskCopy],
    resources: &[Resource],
    running: &[Option<TaskCopy>],
    estimator: &E,
) -> Schedule {
    let mut schedule = Schedule::new(resources.to_vec(), tasks.to_vec());
    schedule.active_tasks = tasks.len();
    for (rix, r) in running.iter().enumerate() {
        schedule.running_tasks[rix] = r.as_ref().map(|t| t.id);
    }
    let mut ext = ScheduleExt::new(schedule);

    let h = heights(tasks);
    let max_height = h.iter().copied().max().unwrap_or(0);
    for height in 0..=max_height {
        for (rix, _resource) in resources.iter().enumerate() {
            for &tix in &chromo.per_resource[rix] {
                if h[tix] != height {
                    continue;
                }
                let task = &tasks[tix];
                if !task.valid_resource(resources[rix].id) {
                    continue;
                }
                let entry = TaskEntry::new(task.original.clone(), task.progress, task.checkpoints);
                ext.add_entry(entry, rix, None, estimator);
            }
        }
    }
    ext.into_schedule()
}

impl MappingAlgorithm for Genetic {
    fn name(&self) -> &'static str {
        if !self.migration {
            "genetic"
        } else if self.objective == Objective::Energy {
            "geneticmig_energy"
        } else {
            "geneticmig"
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

        if tasks.is_empty() {
            let mut schedule = Schedule::new(resources, vec![]);
            schedule.compute_times();
            return Some(schedule);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let h = heights(&tasks);

        let mut population: Vec<Chromosome> = (0..self.population)
            .map(|_| {
                let mut c = random_chromosome(&tasks, &resources, &h, &mut rng);
                c.fitness = if self.migration {
                    evaluate_migration_fitness(&c, &tasks, &resources, self.objective, estimator)
                } else {
                    evaluate_fitness(&c, &tasks, &resources, self.objective, estimator)
                };
                c
            })
            .collect();

        let mut best = population.iter().cloned().min_by(|a, b| a.fitness.total_cmp(&b.fitness)).unwrap();
        let mut nochange = 0u32;

        while nochange < self.max_nochange {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name(), "interrupted");
                return None;
            }

            let max_fitness = population.iter().map(|c| c.fitness).fold(0.0, f64::max);
            let weights: Vec<f64> = population.iter().map(|c| (max_fitness - c.fitness).max(1e-9)).collect();
            let total_weight: f64 = weights.iter().sum();

            let mut next_gen = vec![best.clone()]; // elitism
            while next_gen.len() < population.len() {
                let parent_a = roulette_pick(&population, &weights, total_weight, &mut rng);
                let parent_b = roulette_pick(&population, &weights, total_weight, &mut rng);
                let max_height = h.iter().copied().max().unwrap_or(0);
                let cut = if max_height > 0 { rng.gen_range(0..=max_height) } else { 0 };
                let (mut child_a, mut child_b) = crossover(parent_a, parent_b, cut, &h);
                mutate(&mut child_a, &h, &mut rng);
                mutate(&mut child_b, &h, &mut rng);
                child_a.fitness = if self.migration {
                    evaluate_migration_fitness(&child_a, &tasks, &resources, self.objective, estimator)
                } else {
                    evaluate_fitness(&child_a, &tasks, &resources, self.objective, estimator)
                };
                child_b.fitness = if self.migration {
                    evaluate_migration_fitness(&child_b, &tasks, &resources, self.objective, estimator)
                } else {
                    evaluate_fitness(&child_b, &tasks, &resources, self.objective, estimator)
                };
                next_gen.push(child_a);
                if next_gen.len() < population.len() {
                    next_gen.push(child_b);
                }
            }

            population = next_gen;
            let round_best = population.iter().cloned().min_by(|a, b| a.fitness.total_cmp(&b.fitness)).unwrap();
            if round_best.fitness + 1e-9 < best.fitness {
                best = round_best;
                nochange = 0;
            } else {
                nochange += 1;
            }
        }

        Some(chromosome_to_schedule(&best, &tasks, &resources, &running, estimator))
    }
}

impl Clone for Chromosome {
    fn clone(&self) -> Self {
        Chromosome { per_resource: self.per_resource.clone(), fitness: self.fitness }
    }
}

fn roulette_pick<'a>(
    population: &'a [Chromosome],
    weights: &[f64],
    total_weight: f64,
    rng: &mut impl Rng,
) -> &'a Chromosome {
    if total_weight <= 0.0 {
        return &population[rng.gen_range(0..population.len())];
    }
    let mut pick = rng.gen_range(0.0..total_weight);
    for (c, w) in population.iter().zip(weights) {
        if pick < *w {
            return c;
        }
        pick -= w;
    }
    population.last().unwrap()
}

/// Delegates fitness to the MILP migration planner: the chromosome is
/// rejected (`DOUBLE_MAX`) if any task sits on an incompatible resource.
fn evaluate_migration_fitness<E: Estimator>(
    chromo: &Chromosome,
    tasks: &[TaskCopy],
    resources: &[Resource],
    objective: Objective,
    estimator: &E,
) -> f64 {
    for (rix, resource) in resources.iter().enumerate() {
        for &tix in &chromo.per_resource[rix] {
            if !tasks[tix].valid_resource(resource.id) {
                return DOUBLE_MAX;
            }
        }
    }
    let planner = MigrationPlanner::new(ReferenceSolver);
    planner
        .solve(&chromo.per_resource, tasks, resources, objective, estimator)
        .map(|result| result.fitness)
        .unwrap_or(DOUBLE_MAX)
}
