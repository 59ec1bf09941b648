//! Optional TOML configuration file.
//!
//! ```toml
//! [subdivision]
//! criterion = { max_edge_length = 0.05 }
//! max_points = 2000000
//!
//! [smoothing]
//! iterations = 3
//! max_neighbor_distance = 0.2
//!
//! [filter]
//! edge_ratio = 3.0
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use densemesh_mesh::SubdivisionSettings;
use serde::{Deserialize, Serialize};

/// Laplacian smoothing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub iterations: usize,
    /// Neighbours farther than this are ignored.
    pub max_neighbor_distance: Option<f64>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            max_neighbor_distance: None,
        }
    }
}

/// Triangle filter parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop triangles whose longest edge reaches this multiple of the mean.
    pub edge_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { edge_ratio: 3.0 }
    }
}

/// Everything the configuration file may set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub subdivision: SubdivisionSettings,
    pub smoothing: SmoothingConfig,
    pub filter: FilterConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.subdivision.validate()?;
        if !(config.filter.edge_ratio.is_finite() && config.filter.edge_ratio > 0.0) {
            anyhow::bail!("filter.edge_ratio must be positive, got {}", config.filter.edge_ratio);
        }
        Ok(config)
    }

    /// Read `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
