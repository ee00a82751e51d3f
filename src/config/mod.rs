//! Scheduler configuration loading and management.
//!
//! Holds the per-algorithm tuning blocks (`sa`, `kpb`, `genetic`,
//! `simulated_annealing`) consumed by [`crate::algorithm::AlgorithmRegistry`].
//!
//! The expected YAML structure is:
//! ```yaml
//! algorithms:
//!   sa:
//!     ratio_lower: 0.3
//!     ratio_higher: 0.7
//!   kpb:
//!     percentage: 25.0
//!   genetic:
//!     seed: 42
//!     population: 20
//!     max_nochange: 10
//!   simulated_annealing:
//!     init_prob: 0.8
//!     loops_factor: 1.0
//!     reduce: 0.95
//!     min_prob: 0.01
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info, warn};

// ── Per-algorithm config blocks ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SaConfig {
    #[serde(default = "default_ratio_lower")]
    pub ratio_lower: f64,
    #[serde(default = "default_ratio_higher")]
    pub ratio_higher: f64,
}

fn default_ratio_lower() -> f64 {
    0.3
}
fn default_ratio_higher() -> f64 {
    0.7
}

impl Default for SaConfig {
    fn default() -> Self {
        SaConfig { ratio_lower: default_ratio_lower(), ratio_higher: default_ratio_higher() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct KpbConfig {
    #[serde(default = "default_kpb_percentage")]
    pub percentage: f64,
}

fn default_kpb_percentage() -> f64 {
    20.0
}

impl Default for KpbConfig {
    fn default() -> Self {
        KpbConfig { percentage: default_kpb_percentage() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeneticConfig {
    #[serde(default = "default_genetic_seed")]
    pub seed: u64,
    #[serde(default = "default_genetic_population")]
    pub population: usize,
    #[serde(default = "default_genetic_max_nochange")]
    pub max_nochange: u32,
}

fn default_genetic_seed() -> u64 {
    42
}
fn default_genetic_population() -> usize {
    20
}
fn default_genetic_max_nochange() -> u32 {
    10
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            seed: default_genetic_seed(),
            population: default_genetic_population(),
            max_nochange: default_genetic_max_nochange(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SimAnnConfig {
    #[serde(default = "default_init_prob")]
    pub init_prob: f64,
    #[serde(default = "default_loops_factor")]
    pub loops_factor: f64,
    #[serde(default = "default_reduce")]
    pub reduce: f64,
    #[serde(default = "default_min_prob")]
    pub min_prob: f64,
    #[serde(default = "default_genetic_seed")]
    pub seed: u64,
}

fn default_init_prob() -> f64 {
    0.8
}
fn default_loops_factor() -> f64 {
    1.0
}
fn default_reduce() -> f64 {
    0.95
}
fn default_min_prob() -> f64 {
    0.01
}

impl Default for SimAnnConfig {
    fn default() -> Self {
        SimAnnConfig {
            init_prob: default_init_prob(),
            loops_factor: default_loops_factor(),
            reduce: default_reduce(),
            min_prob: default_min_prob(),
            seed: default_genetic_seed(),
        }
    }
}

/// One parsed algorithm config block, tagged by which algorithm it tunes.
/// The registry looks these up by name and narrows with the `as_*`
/// accessors; an algorithm whose block is absent falls back to its own
/// `Default`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlgorithmConfig {
    Sa(SaConfig),
    Kpb(KpbConfig),
    Genetic(GeneticConfig),
    SimAnn(SimAnnConfig),
}

impl AlgorithmConfig {
    pub fn as_sa(&self) -> Option<&SaConfig> {
        match self {
            AlgorithmConfig::Sa(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_kpb(&self) -> Option<&KpbConfig> {
        match self {
            AlgorithmConfig::Kpb(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_genetic(&self) -> Option<&GeneticConfig> {
        match self {
            AlgorithmConfig::Genetic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_simann(&self) -> Option<&SimAnnConfig> {
        match self {
            AlgorithmConfig::SimAnn(c) => Some(c),
            _ => None,
        }
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct AlgorithmConfigFile {
    sa: Option<SaConfig>,
    kpb: Option<KpbConfig>,
    genetic: Option<GeneticConfig>,
    simulated_annealing: Option<SimAnnConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerConfigFile {
    #[serde(default)]
    algorithms: AlgorithmConfigFile,
}

// ── SchedulerConfigManager ─────────────────────────────────────────────────────

/// Loads and manages the algorithm tuning blocks from a YAML file.
#[derive(Debug, Default)]
pub struct SchedulerConfigManager {
    algorithms: BTreeMap<String, AlgorithmConfig>,
    loaded: bool,
}

impl SchedulerConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `path` and populates the internal algorithm-config map. Any
    /// algorithm block missing from the file is simply absent from the
    /// map; `AlgorithmRegistry::with_defaults` falls back to that
    /// algorithm's own `Default` in that case.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the YAML is
    /// structurally invalid.
    pub fn load_from_file(&mut self, path: &Path) -> anyhow::Result<()> {
        info!("Loading scheduler configuration from: {}", path.display());

        self.algorithms.clear();
        self.loaded = false;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let file: SchedulerConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        if let Some(sa) = file.algorithms.sa {
            self.algorithms.insert("sa".to_string(), AlgorithmConfig::Sa(sa));
        }
        if let Some(kpb) = file.algorithms.kpb {
            self.algorithms.insert("kpb".to_string(), AlgorithmConfig::Kpb(kpb));
        }
        if let Some(genetic) = file.algorithms.genetic {
            self.algorithms.insert("genetic".to_string(), AlgorithmConfig::Genetic(genetic));
        }
        if let Some(simann) = file.algorithms.simulated_annealing {
            self.algorithms.insert("simulated_annealing".to_string(), AlgorithmConfig::SimAnn(simann));
        }

        if self.algorithms.is_empty() {
            warn!("No algorithm tuning blocks found in configuration file, every algorithm uses its default");
        }

        self.loaded = true;
        debug!(count = self.algorithms.len(), "loaded algorithm configuration block(s)");

        Ok(())
    }

    pub fn algorithms(&self) -> &BTreeMap<String, AlgorithmConfig> {
        &self.algorithms
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn default_configs_have_documented_values() {
        assert_eq!(SaConfig::default().ratio_lower, 0.3);
        assert_eq!(KpbConfig::default().percentage, 20.0);
        assert_eq!(GeneticConfig::default().population, 20);
        assert_eq!(SimAnnConfig::default().min_prob, 0.01);
    }

    #[test]
    fn load_full_config() {
        let yaml = r#"
algorithms:
  sa:
    ratio_lower: 0.2
    ratio_higher: 0.8
  kpb:
    percentage: 30.0
  genetic:
    seed: 7
    population: 40
    max_nochange: 15
  simulated_annealing:
    init_prob: 0.9
    loops_factor: 2.0
    reduce: 0.9
    min_prob: 0.001
    seed: 7
"#;
        let f = yaml_tempfile(yaml);
        let mut mgr = SchedulerConfigManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.is_loaded());
        assert_eq!(mgr.algorithms().len(), 4);
        assert_eq!(mgr.algorithms().get("sa").unwrap().as_sa().unwrap().ratio_lower, 0.2);
        assert_eq!(mgr.algorithms().get("genetic").unwrap().as_genetic().unwrap().population, 40);
    }

    #[test]
    fn partial_config_leaves_other_algorithms_absent() {
        let yaml = "algorithms:\n  kpb:\n    percentage: 50.0\n";
        let f = yaml_tempfile(yaml);
        let mut mgr = SchedulerConfigManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert_eq!(mgr.algorithms().len(), 1);
        assert!(mgr.algorithms().get("sa").is_none());
    }

    #[test]
    fn empty_file_loads_with_no_algorithm_blocks() {
        let f = yaml_tempfile("algorithms: {}\n");
        let mut mgr = SchedulerConfigManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.is_loaded());
        assert!(mgr.algorithms().is_empty());
    }

    #[test]
    fn missing_file_returns_error() {
        let mut mgr = SchedulerConfigManager::new();
        let result = mgr.load_from_file(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let mut mgr = SchedulerConfigManager::new();
        let result = mgr.load_from_file(f.path());
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }
}
