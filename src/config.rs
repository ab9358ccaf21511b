//! Monitor configuration
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! ignored_dirs = [".git", "bin", "obj"]
//! case_insensitive_paths = false
//! poll_interval_ms = 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MonitorError, Result};
use crate::paths::PathPolicy;

/// Directory names excluded from change tracking at any depth
pub const DEFAULT_IGNORED_DIRS: [&str; 3] = [".git", "bin", "obj"];

/// Lower bound on the assessment interval so the CLI loop never spins
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration shared by the monitoring service and every session it starts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Path segments (compared case-insensitively) whose subtrees are never tracked
    pub ignored_dirs: Vec<String>,
    /// Whether known/expected paths compare case-insensitively
    pub case_insensitive_paths: bool,
    /// Interval between reload assessments in the CLI loop (default: 1000ms)
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            case_insensitive_paths: PathPolicy::platform_default() == PathPolicy::CaseInsensitive,
            poll_interval_ms: 1000,
        }
    }
}

impl MonitorConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MonitorError::Config {
            message: e.to_string(),
        })
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MonitorError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Path comparison policy derived from `case_insensitive_paths`
    pub fn path_policy(&self) -> PathPolicy {
        if self.case_insensitive_paths {
            PathPolicy::CaseInsensitive
        } else {
            PathPolicy::CaseSensitive
        }
    }

    /// Assessment interval, clamped to at least [`MIN_POLL_INTERVAL`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(MIN_POLL_INTERVAL)
    }
}
