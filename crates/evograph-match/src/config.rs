//! Matching thresholds, overridable from an optional `evograph.toml`

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Thresholds steering the matcher and the location resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum confidence for a pairing to be committed at all.
    pub accept_threshold: f64,
    /// Confidence at which lower-priority matchers are no longer consulted.
    pub early_exit_threshold: f64,
    /// Line slack when resolving refactoring locations to nodes. Absorbs
    /// off-by-a-few disagreements between the front end and the detector.
    pub line_tolerance: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            accept_threshold: 0.5,
            early_exit_threshold: 0.8,
            line_tolerance: 2,
        }
    }
}

impl MatchConfig {
    /// Read thresholds from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: MatchConfig =
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `evograph.toml` from the given directory, falling back to the
    /// defaults when the file does not exist.
    pub fn load_or_default(root: &Path) -> anyhow::Result<Self> {
        let path = root.join("evograph.toml");
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
