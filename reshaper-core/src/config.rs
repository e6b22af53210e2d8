use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_min_parallel_elements() -> usize {
    64
}

/// Execution settings shared by the transformation and validation engines.
///
/// None of these change what an evaluation produces, only how the work is
/// scheduled and what gets reported about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Evaluate the targets of a rule set concurrently
    #[serde(default = "default_true")]
    pub parallel_targets: bool,
    /// Fan a top-level array out across workers during validation
    #[serde(default = "default_true")]
    pub parallel_elements: bool,
    /// Arrays shorter than this are always validated sequentially
    #[serde(default = "default_min_parallel_elements")]
    pub min_parallel_elements: usize,
    /// Upper bound on worker threads (defaults to available parallelism)
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// Report per-step execution times through the diagnostics sink
    #[serde(default)]
    pub log_timings: bool,
}

impl EngineConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|err| {
                tracing::warn!(path = p, error = %err, "Failed to load engine config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Sequential settings, handy for deterministic diagnostics ordering
    pub fn sequential() -> Self {
        Self {
            parallel_targets: false,
            parallel_elements: false,
            ..Self::default()
        }
    }

    /// Number of worker threads to use, never less than one.
    pub fn workers(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        match self.max_workers {
            Some(max) => max.clamp(1, available.max(1)),
            None => available,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_targets: true,
            parallel_elements: true,
            min_parallel_elements: default_min_parallel_elements(),
            max_workers: None,
            log_timings: false,
        }
    }
}
