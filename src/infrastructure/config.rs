//! Trace configuration.
//!
//! Loaded from a TOML file (`deptrace.toml` by default). Every key is
//! optional; command-line flags override whatever the file sets.

use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::domain::case_builder::SelfLoopPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "deptrace.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// How a module that lists itself as a lead is handled
    pub self_loop_policy: SelfLoopPolicy,
    /// Trailing path segments kept when shortening paths in diagnostics
    pub path_context_segments: usize,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the emitted case file
    pub pretty: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            self_loop_policy: SelfLoopPolicy::SkipEdge,
            path_context_segments: 3,
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl TraceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid trace configuration")
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
