//! Engine configuration
//!
//! All tunables live in an explicit [`EngineConfig`] value object passed to
//! the orchestrator at construction. No ambient or global mutable state:
//! the engine's behavior is a pure function of its inputs and this config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::Severity;

/// Severity-weighted scoring penalties.
///
/// The penalty curve is a heuristic default, so it is carried in config
/// rather than hard-coded in the aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            critical: 25,
            high: 10,
            medium: 4,
            low: 1,
        }
    }
}

impl ScoreWeights {
    pub fn penalty(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Files larger than this are skipped with reason `too-large`.
    pub max_file_size: u64,
    /// Maximum number of files analyzed per run; overflow files are
    /// skipped with reason `file-limit`.
    pub max_files: usize,
    /// Maximum concurrent in-flight file analyses.
    pub concurrency_limit: usize,
    /// Wall-clock timeout for a single external tool invocation.
    pub tool_timeout: Duration,
    /// Overall deadline for the run; unfinished files are marked
    /// `timed-out` and the run completes with partial results.
    pub analysis_timeout: Duration,
    /// Directory names excluded from enumeration.
    pub ignore_dirs: Vec<String>,
    /// Whether external tools are invoked at all.
    pub external_tools: bool,
    /// Cap on the report's `top_issues` list.
    pub top_issues_cap: usize,
    pub weights: ScoreWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024,
            max_files: 10_000,
            concurrency_limit: 8,
            tool_timeout: Duration::from_secs(30),
            analysis_timeout: Duration::from_secs(300),
            ignore_dirs: default_ignore_dirs(),
            external_tools: true,
            top_issues_cap: 20,
            weights: ScoreWeights::default(),
        }
    }
}

fn default_ignore_dirs() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "node_modules",
        "vendor",
        "target",
        "dist",
        "build",
        "__pycache__",
        ".venv",
        "venv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn without_external_tools(mut self) -> Self {
        self.external_tools = false;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Whether a directory name is excluded from enumeration.
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|d| d == name)
    }
}
