//! Query configuration.

use crate::error::{MapError, MapResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Defaults applied by the query engine when an annotation is silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Weight of an edge with no `cost` annotation.
    pub default_edge_cost: f64,
    /// Localizer policy for waypoints whose scan-match region defers.
    pub default_scan_match: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_edge_cost: 1.0,
            default_scan_match: true,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> MapResult<()> {
        if !self.default_edge_cost.is_finite() || self.default_edge_cost < 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "default_edge_cost {} must be finite and non-negative",
                self.default_edge_cost
            )));
        }
        Ok(())
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query config {}", path.display()))?;
        let config: QueryConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse query config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}
