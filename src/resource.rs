/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Compute resources (CPU, GPU, FPGA, ...) that tasks execute on.

use serde::Serialize;

pub type ResourceId = usize;

/// A minimal value object: identity plus the idle power the static-energy
/// model needs. `id` is dense `0..resources.len()` so it can index
/// per-resource arrays directly (the arena-index rewrite of the original's
/// raw resource pointers).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    /// Idle power in watts. `0.0` if unknown, matching the original's
    /// "missing attribute yields zero" degrade policy.
    pub idle_power: f64,
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Resource { id, name: name.into(), idle_power: 0.0 }
    }

    pub fn with_idle_power(mut self, idle_power: f64) -> Self {
        self.idle_power = idle_power;
        self
    }

    /// Idle energy (joules) accrued over `seconds` at this resource's idle
    /// power. Returns `0.0` for unknown power, never negative `seconds`.
    pub fn idle_energy(&self, seconds: f64) -> f64 {
        if seconds <= 0.0 {
            return 0.0;
        }
        seconds * self.idle_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_energy_is_time_times_power() {
        let r = Resource::new(0, "cpu0").with_idle_power(2.5);
        assert_eq!(r.idle_energy(4.0), 10.0);
    }

    #[test]
    fn idle_energy_zero_for_negative_seconds() {
        let r = Resource::new(0, "cpu0").with_idle_power(2.5);
        assert_eq!(r.idle_energy(-1.0), 0.0);
    }

    #[test]
    fn default_idle_power_is_zero() {
        let r = Resource::new(1, "gpu0");
        assert_eq!(r.idle_power, 0.0);
        assert_eq!(r.idle_energy(100.0), 0.0);
    }
}
