//! TOML run configuration: engine parameters, optimizer grid and data source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use matrail_core::EngineConfig;

use crate::optimizer::{OptimizeError, OptimizerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine section: {0}")]
    Engine(#[from] matrail_core::ConfigError),

    #[error("invalid optimizer section: {0}")]
    Optimizer(#[from] OptimizeError),
}

/// Where price files live and how much history to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `<SYMBOL>.csv` files.
    pub dir: PathBuf,
    /// Keep only the last `days` bars. `0` keeps everything.
    pub days: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            days: 365,
        }
    }
}

/// Complete configuration of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub optimizer: OptimizerConfig,
    pub data: DataConfig,
}

impl RunConfig {
    /// Parse and validate a TOML document. Missing sections take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}
