//! Run configuration.
//!
//! Every option is fixed for the duration of a run. Values come from the
//! defaults below, optionally overridden by a YAML file, then by CLI flags.

use clap::Args;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::error::PipelineError;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_THRESHOLD: i64 = 900;
pub const DEFAULT_PATTERN: &str = "a";
pub const DEFAULT_SUFFIX: &str = "-improved!";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records per batch handed to the sink
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Numbers strictly above this are kept
    pub threshold: i64,

    /// Regex; text payloads matching it are kept
    pub pattern: String,

    /// Appended to text payloads by the transform stage
    pub suffix: String,

    /// Worker threads for the parallel executor
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_THRESHOLD,
            pattern: DEFAULT_PATTERN.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            workers: default_workers(),
        }
    }
}

/// Command-line overrides. Each value that is set replaces the one loaded
/// from defaults or YAML.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ConfigOverrides {
    /// Records per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Keep numbers above this value
    #[arg(long)]
    pub threshold: Option<i64>,

    /// Keep text matching this regex
    #[arg(long)]
    pub pattern: Option<String>,

    /// Suffix appended to kept text
    #[arg(long)]
    pub suffix: Option<String>,

    /// Only the parallel CLI exposes a flag for this
    #[arg(skip)]
    pub workers: Option<usize>,
}

/// Parallel execution units reported by the host, or 1 if unknown.
///
/// Queried once when a default config is built, never during a run.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl PipelineConfig {
    /// Load from a YAML file if one is given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let Some(path) = path else {
            log::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;

        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Replace every value `overrides` sets.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            batch_size,
            threshold,
            pattern,
            suffix,
            workers,
        } = overrides;
        if let Some(n) = batch_size {
            self.batch_size = n;
        }
        if let Some(t) = threshold {
            self.threshold = t;
        }
        if let Some(p) = pattern {
            self.pattern = p;
        }
        if let Some(s) = suffix {
            self.suffix = s;
        }
        if let Some(w) = workers {
            self.workers = w;
        }
    }

    /// Load from `path` (or defaults) and then apply `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, PipelineError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Check every value before a run starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.batch_size()?;
        self.compile_pattern()?;
        if self.workers == 0 {
            return Err(PipelineError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn batch_size(&self) -> Result<NonZeroUsize, PipelineError> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| PipelineError::Config("batch-size must be at least 1".to_string()))
    }

    pub fn compile_pattern(&self) -> Result<Regex, PipelineError> {
        Regex::new(&self.pattern)
            .map_err(|e| PipelineError::Config(format!("bad pattern '{}': {e}", self.pattern)))
    }
}
