//! Full node implementation

use crate::api::start_api_server;
use crate::runtime::LedgerRuntime;
use itemledger_core::{LedgerResult, NodeConfig, StorageKind};
use itemledger_items::SeedConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Full ITEMLEDGER node
pub struct LedgerNode {
    runtime: Arc<LedgerRuntime>,
}

impl LedgerNode {
    /// Create a new node
    pub fn new(config: NodeConfig, seed: SeedConfig) -> LedgerResult<Self> {
        let runtime = Arc::new(LedgerRuntime::open(config, seed)?);
        Ok(Self { runtime })
    }

    /// Start the node
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting ITEMLEDGER node {}...", self.runtime.config().name);

        if self.runtime.config().seed_on_start {
            self.seed().await?;
        }

        // Start API server
        let api_runtime = self.runtime.clone();
        let api_addr = self.runtime.config().api.listen_addr.clone();

        let api_handle = tokio::spawn(async move {
            if let Err(e) = start_api_server(api_runtime, &api_addr).await {
                error!("API server error: {}", e);
            }
        });

        info!("Node started successfully");
        info!("State version: {}", self.runtime.state_version());
        info!("Records: {}", self.runtime.record_count()?);

        // Wait for shutdown signal
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping node...");
            }
            Err(e) => {
                error!("Error waiting for shutdown signal: {}", e);
            }
        }

        // Cleanup
        api_handle.abort();

        info!("Node stopped");

        Ok(())
    }

    /// Seed an empty ledger on the blocking pool; sled commits flush to disk
    pub async fn seed(&self) -> anyhow::Result<bool> {
        let runtime = self.runtime.clone();
        let seeded = tokio::task::spawn_blocking(move || runtime.initialize()).await??;
        Ok(seeded)
    }

    /// Get runtime reference
    pub fn runtime(&self) -> &Arc<LedgerRuntime> {
        &self.runtime
    }
}

/// Node builder for easier configuration
pub struct NodeBuilder {
    config: NodeConfig,
    seed: SeedConfig,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
            seed: SeedConfig::default(),
        }
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: SeedConfig) -> Self {
        self.seed = seed;
        self
    }

    pub fn api_addr(mut self, addr: &str) -> Self {
        self.config.api.listen_addr = addr.to_string();
        self
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.config.data_dir = dir;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.config.storage = StorageKind::Persistent;
        self
    }

    pub fn skip_seed(mut self) -> Self {
        self.config.seed_on_start = false;
        self
    }

    pub fn build(self) -> LedgerResult<LedgerNode> {
        LedgerNode::new(self.config, self.seed)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let node = NodeBuilder::new().build().unwrap();
        let config = node.runtime().config();

        assert_eq!(config.storage, StorageKind::Memory);
        assert!(config.seed_on_start);
        assert_eq!(node.runtime().contract().seed_config().items.len(), 3);
    }

    #[test]
    fn test_builder_overrides() {
        let tmp = TempDir::new().unwrap();
        let node = NodeBuilder::new()
            .api_addr("0.0.0.0:9000")
            .data_dir(tmp.path().to_path_buf())
            .persistent()
            .skip_seed()
            .seed(SeedConfig::empty().add_item("only", "Only", 1))
            .build()
            .unwrap();
        let config = node.runtime().config();

        assert_eq!(config.api.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.storage, StorageKind::Persistent);
        assert!(!config.seed_on_start);
        assert!(tmp.path().join("state").exists());
        assert_eq!(node.runtime().contract().seed_config().items.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_persistent_node_once() {
        let tmp = TempDir::new().unwrap();
        let node = NodeBuilder::new()
            .data_dir(tmp.path().to_path_buf())
            .persistent()
            .build()
            .unwrap();

        assert!(node.seed().await.unwrap());
        assert_eq!(node.runtime().record_count().unwrap(), 3);
        assert_eq!(node.runtime().state_version().0, 1);

        assert!(!node.seed().await.unwrap());
        assert_eq!(node.runtime().state_version().0, 1);
    }
}
