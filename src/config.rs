//! Store Configuration
//!
//! Loaded from an optional JSON file; every field has a default.

use std::path::Path;

use board_logger::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a late-resolving operation may do to state written after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Every resolution is applied, even over newer optimistic writes
    #[default]
    LastResolutionWins,
    /// A commit or rollback is dropped when any entity it wrote has since
    /// been overwritten by another local operation
    SkipStale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub rollback: RollbackPolicy,
    /// Number of error notifications kept for display
    pub error_capacity: usize,
    pub log: LogConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            rollback: RollbackPolicy::default(),
            error_capacity: 16,
            log: LogConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
