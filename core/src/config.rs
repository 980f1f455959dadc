//! Configuration types for ITEMLEDGER

use crate::error::LedgerError;
use crate::traits::LedgerResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// World-state backend
    pub storage: StorageKind,

    /// API configuration
    pub api: ApiConfig,

    /// Run the bootstrap seed when the node starts
    pub seed_on_start: bool,

    /// Logging level
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "itemledger-node".to_string(),
            data_dir: PathBuf::from("./data"),
            storage: StorageKind::Memory,
            api: ApiConfig::default(),
            seed_on_start: true,
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load from JSON
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::ConfigError(e.to_string()))
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Save to JSON
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::SerializationError(e.to_string()))
    }

    /// Path of the persistent state database
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

/// Which backend holds the world state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In-memory, lost on restart
    #[default]
    Memory,
    /// sled database under `data_dir`
    Persistent,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}
