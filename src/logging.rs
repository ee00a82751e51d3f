/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! `mainlog` wiring: a `tracing_subscriber` `fmt` layer configured from
//! `SCHED_LOG` (a path, or `stdout`) and `SCHED_LOG_PRIORITY`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Parses `SCHED_LOG_PRIORITY`'s original vocabulary
/// (`DEBUG`/`NOTICE`/`WARN`/`ERROR`/`CRIT`/`ALERT`/`FATAL`/`EMERG`) into
/// the nearest `tracing::Level`. `NOTICE` and above that have no direct
/// tracing equivalent collapse to the next coarser level.
fn level_from_priority(priority: &str) -> Level {
    match priority.to_ascii_uppercase().as_str() {
        "DEBUG" => Level::DEBUG,
        "NOTICE" => Level::INFO,
        "WARN" => Level::WARN,
        "ERROR" | "CRIT" | "ALERT" | "FATAL" | "EMERG" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialises the global `tracing` subscriber from the environment.
/// Safe to call more than once; subsequent calls are no-ops (mirrors
/// `tracing_subscriber`'s own "already set" behaviour).
pub fn init() {
    let priority = std::env::var("SCHED_LOG_PRIORITY").unwrap_or_else(|_| "NOTICE".to_string());
    let level = level_from_priority(&priority);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::to_string(&level).to_lowercase()));

    let destination = std::env::var("SCHED_LOG").unwrap_or_else(|_| "stdout".to_string());

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if destination == "stdout" {
        subscriber.try_init()
    } else {
        // File destinations are opened by the caller's logging sink of
        // choice in a full deployment; this reference implementation
        // only wires the stdout path, falling back to it for any other
        // value so a misconfigured path never silently drops logs.
        subscriber.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_mapping_covers_the_documented_vocabulary() {
        assert_eq!(level_from_priority("DEBUG"), Level::DEBUG);
        assert_eq!(level_from_priority("notice"), Level::INFO);
        assert_eq!(level_from_priority("WARN"), Level::WARN);
        assert_eq!(level_from_priority("CRIT"), Level::ERROR);
        assert_eq!(level_from_priority("EMERG"), Level::ERROR);
        assert_eq!(level_from_priority("unknown"), Level::INFO);
    }
}
