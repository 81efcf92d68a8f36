//! Engine configuration, persisted as TOML.
//!
//! ```toml
//! seeds = ["mechanics"]
//!
//! [graph]
//! store_path = "data/formulas.json"
//! max_path_depth = 6
//!
//! [planner]
//! max_plans = 5
//! prefer_fundamental = true
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::planner::PlannerConfig;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Graph storage and traversal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// JSON store file. `None` for memory-only mode.
    pub store_path: Option<PathBuf>,
    /// Default depth limit for path enumeration.
    pub max_path_depth: usize,
    /// Directory searched for external seed packs.
    pub seeds_dir: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            max_path_depth: 6,
            seeds_dir: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed pack ids applied when the engine starts without a stored graph.
    pub seeds: Vec<String>,
    pub graph: GraphConfig,
    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds: vec!["mechanics".into()],
            graph: GraphConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl Config {
    /// A memory-only configuration with no seed packs.
    pub fn empty() -> Self {
        Self {
            seeds: Vec::new(),
            ..Default::default()
        }
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph.store_path = Some(path.into());
        self
    }

    pub fn with_seeds_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.graph.seeds_dir = Some(dir.into());
        self
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "(inline)".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            path: path.display().to_string(),
            source: e,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
