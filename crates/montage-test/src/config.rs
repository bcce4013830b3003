//! Leak tracker configuration.
//!
//! Loaded from TOML and validated before use:
//!
//! ```toml
//! [leak]
//! tracked_kinds = ["element", "pad", "pipeline"]
//! max_collect_passes = 16
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use montage_core::TrackedKind;

use crate::error::{Result, TestError};

/// Leak tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakTrackerConfig {
    /// Kinds whose new live instances fail a test.
    #[serde(default = "TrackedKind::default_tracked")]
    pub tracked_kinds: Vec<TrackedKind>,

    /// Upper bound on collection passes before giving up.
    #[serde(default = "default_max_collect_passes")]
    pub max_collect_passes: usize,
}

fn default_max_collect_passes() -> usize {
    64
}

impl Default for LeakTrackerConfig {
    fn default() -> Self {
        Self {
            tracked_kinds: TrackedKind::default_tracked(),
            max_collect_passes: default_max_collect_passes(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    leak: LeakTrackerConfig,
}

impl LeakTrackerConfig {
    /// Creates a configuration tracking the given kinds.
    #[must_use]
    pub fn tracking(kinds: impl IntoIterator<Item = TrackedKind>) -> Self {
        Self {
            tracked_kinds: kinds.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if no kinds are tracked or no collection pass is
    /// allowed.
    pub fn validate(&self) -> Result<()> {
        if self.tracked_kinds.is_empty() {
            return Err(TestError::config("tracked_kinds cannot be empty"));
        }
        if self.max_collect_passes == 0 {
            return Err(TestError::config("max_collect_passes must be at least 1"));
        }
        Ok(())
    }

    /// Parses the `[leak]` table of a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| TestError::config(format!("failed to parse config: {e}")))?;
        file.leak.validate()?;
        Ok(file.leak)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
