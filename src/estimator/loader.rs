/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Loaders that populate typed cost/power tables from external files —
//! the `resourceloaderms` and `taskloaderms` sources from the
//! configuration (SPEC_FULL §4.9/§4.10).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::CostSample;

/// `resourceloaderms_idle` JSON: four arrays of sampled idle-power
/// wattages, one per resource class.
#[derive(Debug, Deserialize)]
struct IdlePowerFile {
    #[serde(default)]
    cpu_power_avg: Vec<f64>,
    #[serde(default)]
    gpu_power_avg: Vec<f64>,
    #[serde(default)]
    fpga_power_avg: Vec<f64>,
    #[serde(default)]
    all_power_avg: Vec<f64>,
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Average idle power per resource class, keyed by name prefix
/// ("cpu", "gpu", "fpga"), with "all" as the fallback mean.
pub struct ResourcePowerLoader;

impl ResourcePowerLoader {
    pub fn load_ms(path: &Path) -> Result<HashMap<String, f64>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading idle power file {}", path.display()))?;
        let parsed: IdlePowerFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing idle power JSON {}", path.display()))?;

        let mut out = HashMap::new();
        if let Some(m) = mean(&parsed.cpu_power_avg) {
            out.insert("cpu".to_string(), m);
        }
        if let Some(m) = mean(&parsed.gpu_power_avg) {
            out.insert("gpu".to_string(), m);
        }
        if let Some(m) = mean(&parsed.fpga_power_avg) {
            out.insert("fpga".to_string(), m);
        }
        if let Some(m) = mean(&parsed.all_power_avg) {
            out.insert("all".to_string(), m);
        }
        Ok(out)
    }

    /// Power for a resource named e.g. `"gpu0"`: matches on the longest
    /// known class prefix, falling back to the `"all"` mean.
    pub fn power_for(table: &HashMap<String, f64>, resource_name: &str) -> f64 {
        for class in ["cpu", "gpu", "fpga"] {
            if resource_name.starts_with(class) {
                if let Some(p) = table.get(class) {
                    return *p;
                }
            }
        }
        table.get("all").copied().unwrap_or(0.0)
    }
}

/// One averaged row from a `ms_<name>(<size>)@<resource>_{time|energy}.csv`
/// file: `ETotal; TTotal; ETask; TTask; TInit; TComp; TFini`.
#[derive(Debug, Clone, Copy, Default)]
struct MsCsvRow {
    e_total: f64,
    t_total: f64,
    e_task: f64,
    t_task: f64,
    t_init: f64,
    t_comp: f64,
    t_fini: f64,
}

fn parse_row(line: &str) -> Option<MsCsvRow> {
    let fields: Vec<f64> = line
        .split(';')
        .map(|f| f.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if fields.len() != 7 {
        return None;
    }
    Some(MsCsvRow {
        e_total: fields[0],
        t_total: fields[1],
        e_task: fields[2],
        t_task: fields[3],
        t_init: fields[4],
        t_comp: fields[5],
        t_fini: fields[6],
    })
}

fn average_rows(rows: &[MsCsvRow]) -> MsCsvRow {
    let n = rows.len().max(1) as f64;
    let mut acc = MsCsvRow::default();
    for r in rows {
        acc.e_total += r.e_total;
        acc.t_total += r.t_total;
        acc.e_task += r.e_task;
        acc.t_task += r.t_task;
        acc.t_init += r.t_init;
        acc.t_comp += r.t_comp;
        acc.t_fini += r.t_fini;
    }
    MsCsvRow {
        e_total: acc.e_total / n,
        t_total: acc.t_total / n,
        e_task: acc.e_task / n,
        t_task: acc.t_task / n,
        t_init: acc.t_init / n,
        t_comp: acc.t_comp / n,
        t_fini: acc.t_fini / n,
    }
}

/// Loads `ms_<name>(<size>)@<resource>_{time|energy}.csv` files from a
/// directory into per-(task name, resource name) `CostSample`s.
pub struct TaskCostTableLoader;

impl TaskCostTableLoader {
    pub fn load_ms(dir: &Path) -> Result<HashMap<(String, String), CostSample>> {
        let mut out: HashMap<(String, String), CostSample> = HashMap::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("reading task cost directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some((task_name, resource_name)) = parse_ms_filename(&file_name) {
                let content = fs::read_to_string(entry.path())
                    .with_context(|| format!("reading {}", entry.path().display()))?;
                let rows: Vec<MsCsvRow> = content.lines().filter_map(parse_row).collect();
                if rows.is_empty() {
                    continue;
                }
                let avg = average_rows(&rows);
                let key = (task_name, resource_name);
                let sample = out.entry(key).or_default();
                sample.time_init += avg.t_init;
                sample.time_compute_full += avg.t_comp;
                sample.time_fini += avg.t_fini;
                sample.energy_compute_full += avg.e_task;
            }
        }
        Ok(out)
    }
}

/// Parses `ms_<name>(<size>)@<resource>_{time|energy}.csv` into
/// `(name, resource)`. Returns `None` for names that do not match.
fn parse_ms_filename(name: &str) -> Option<(String, String)> {
    let stem = name.strip_prefix("ms_")?;
    let stem = stem.strip_suffix("_time.csv").or_else(|| stem.strip_suffix("_energy.csv"))?;
    let at_pos = stem.rfind('@')?;
    let (task_part, resource) = stem.split_at(at_pos);
    let resource = &resource[1..];
    let task_name = task_part.split('(').next().unwrap_or(task_part);
    Some((task_name.to_string(), resource.to_string()))
}
