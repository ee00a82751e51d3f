/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated annealing over the same chromosome representation as
//! [`super::genetic`]: a calibration pass picks the initial temperature
//! from the observed spread of single-mutation deltas, then a geometric
//! cooling schedule accepts downhill moves unconditionally and uphill
//! moves with probability `exp(delta / temperature)`.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SimAnnConfig;
use crate::estimator::Estimator;
use crate::resource::Resource;
use crate::task::TaskCopy;

use super::genetic::{chromosome_to_schedule, evaluate_fitness, heights, mutate, random_chromosome, Objective};
use super::MappingAlgorithm;
use crate::schedule::Schedule;

pub struct SimulatedAnnealing {
    init_prob: f64,
    loops_factor: f64,
    reduce: f64,
    min_prob: f64,
    seed: u64,
}

impl SimulatedAnnealing {
    pub fn new(cfg: Option<&SimAnnConfig>) -> Self {
        let cfg = cfg.cloned().unwrap_or_default();
        SimulatedAnnealing {
            init_prob: cfg.init_prob,
            loops_factor: cfg.loops_factor,
            reduce: cfg.reduce,
            min_prob: cfg.min_prob,
            seed: cfg.seed,
        }
    }
}

impl MappingAlgorithm for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "simann"
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
        let objective = Objective::Makespan;

        let mut current = random_chromosome(&tasks, &resources, &h, &mut rng);
        current.fitness = evaluate_fitness(&current, &tasks, &resources, objective, estimator);
        let mut best = current.clone();

        // Calibration: 2 * tasks * loops_factor single mutations, collect
        // |delta fitness| samples, derive T from the p-th percentile delta
        // so that P(accept that delta) == init_prob.
        let calibration_moves = ((2.0 * tasks.len() as f64) * self.loops_factor).round().max(1.0) as usize;
        let mut deltas = Vec::with_capacity(calibration_moves);
        let mut calib = current.clone();
        for _ in 0..calibration_moves {
            if interrupt.load(Ordering::Relaxed) {
                tracing::warn!(algorithm = self.name(), "interrupted during calibration");
                return None;
            }
            let mut neighbour = calib.clone();
            mutate(&mut neighbour, &h, &mut rng);
            neighbour.fitness = evaluate_fitness(&neighbour, &tasks, &resources, objective, estimator);
            deltas.push((calib.fitness - neighbour.fitness).abs());
            calib = neighbour;
        }
        deltas.sort_by(|a, b| a.total_cmp(b));
        let percentile_index = ((deltas.len() as f64) * 0.9).floor() as usize;
        let delta_p = deltas.get(percentile_index.min(deltas.len().saturating_sub(1))).copied().unwrap_or(1.0).max(1e-9);
        let mut temperature = -delta_p / self.init_prob.ln().min(-1e-9);
        if !temperature.is_finite() || temperature <= 0.0 {
            temperature = 1.0;
        }

        let moves_per_temp = ((self.loops_factor * tasks.len() as f64).round().max(1.0)) as usize;

        loop {
            let mut accepted_over_min_prob = 0usize;

            for _ in 0..moves_per_temp {
                if interrupt.load(Ordering::Relaxed) {
                    tracing::warn!(algorithm = self.name(), "interrupted during annealing");
                    return None;
                }

                let mut neighbour = current.clone();
                mutate(&mut neighbour, &h, &mut rng);
                neighbour.fitness = evaluate_fitness(&neighbour, &tasks, &resources, objective, estimator);

                // delta = current - neighbour; positive means downhill (improvement).
                let delta = current.fitness - neighbour.fitness;
                let accept = if delta >= 0.0 {
                    true
                } else {
                    let p = (delta / temperature).exp();
                    if p >= self.min_prob {
                        accepted_over_min_prob += 1;
                    }
                    rng.gen::<f64>() < p
                };

                if accept {
                    current = neighbour;
                    if current.fitness < best.fitness {
                        best = current.clone();
                    }
                }
            }

            temperature *= self.reduce;

            if accepted_over_min_prob < 5 {
                break;
            }
        }

        Some(chromosome_to_schedule(&best, &tasks, &resources, &running, estimator))
    }
}
