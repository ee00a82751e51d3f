/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Crate-level error type.
//!
//! | Variant | Meaning | Caller action |
//! |---|---|---|
//! | `Config` | malformed/missing configuration | fail fast at startup |
//! | `UnknownAlgorithm` | registry has no mapper for the requested name | fail fast |
//! | `IncompatibleResource` | a caller asked to place a task on a resource it does not support | reject the request |
//! | `ScheduleInvariant` | `compute_times()` made no progress in a full pass | log and return the partial schedule |
//! | `SolverFailed` | the MILP solver exited with a non-recoverable status | treat the candidate chromosome as infeasible |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("task {task} is not compatible with resource {resource}")]
    IncompatibleResource { task: u64, resource: String },

    #[error("schedule invariant violated: {0}")]
    ScheduleInvariant(String),

    #[error("MILP solver failed for candidate {candidate}")]
    SolverFailed { candidate: usize },
}

pub type Result<T> = std::result::Result<T, SchedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_message() {
        let err = SchedError::UnknownAlgorithm("bogus".into());
        assert_eq!(err.to_string(), "unknown algorithm: bogus");
    }

    #[test]
    fn incompatible_resource_message() {
        let err = SchedError::IncompatibleResource { task: 7, resource: "gpu0".into() };
        assert_eq!(err.to_string(), "task 7 is not compatible with resource gpu0");
    }

    #[test]
    fn config_wraps_anyhow() {
        let inner = anyhow::anyhow!("bad yaml");
        let err: SchedError = inner.into();
        assert!(err.to_string().contains("bad yaml"));
    }
}
