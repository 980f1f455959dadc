//! Node runtime: one world-state transaction per invocation

use itemledger_core::{
    LedgerError, LedgerResult, NodeConfig, StateProvider, StateVersion, StorageKind,
};
use itemledger_items::{Invocation, ItemContract, SeedConfig};
use itemledger_state::{
    create_memory_store, create_persistent_store, LedgerTransaction, StateStore,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared handle to whichever backend the node runs on
pub type SharedStateStore = Arc<dyn StateStore>;

/// Node runtime managing the world state and the item contract
pub struct LedgerRuntime {
    config: NodeConfig,
    state: SharedStateStore,
    contract: ItemContract,
    /// Serializes begin -> execute -> commit
    tx_lock: Mutex<()>,
    committed: RwLock<u64>,
}

impl LedgerRuntime {
    /// Create a runtime over an existing backend
    pub fn new(config: NodeConfig, state: SharedStateStore, contract: ItemContract) -> Self {
        Self {
            config,
            state,
            contract,
            tx_lock: Mutex::new(()),
            committed: RwLock::new(0),
        }
    }

    /// Open the backend named in the config
    pub fn open(config: NodeConfig, seed: SeedConfig) -> LedgerResult<Self> {
        let state: SharedStateStore = match config.storage {
            StorageKind::Memory => create_memory_store(),
            StorageKind::Persistent => {
                let path = config.state_path();
                std::fs::create_dir_all(&path)?;
                info!("Opening persistent state at {}", path.display());
                create_persistent_store(&path)?
            }
        };

        Ok(Self::new(config, state, ItemContract::with_seed(seed)))
    }

    /// Run `InitLedger` on an empty world state.
    ///
    /// Returns whether seeding ran; a ledger that already holds records is
    /// left alone.
    pub fn initialize(&self) -> LedgerResult<bool> {
        if !self.state.is_empty()? {
            info!(
                "World state already holds {} record(s), skipping seed",
                self.state.len()?
            );
            return Ok(false);
        }

        self.execute(&Invocation::InitLedger)?;
        info!("Ledger seeded at {}", self.state_version());
        Ok(true)
    }

    /// Parse and run a named function
    pub fn invoke(&self, function: &str, args: &[String]) -> LedgerResult<Vec<u8>> {
        let invocation = Invocation::parse(function, args)?;
        self.execute(&invocation)
    }

    /// Run one invocation in its own transaction.
    ///
    /// Mutations are committed only when the contract succeeds; queries
    /// and failures are rolled back.
    pub fn execute(&self, invocation: &Invocation) -> LedgerResult<Vec<u8>> {
        let _guard = self.tx_lock.lock();
        let tx = LedgerTransaction::new(self.state.as_ref());

        match self.contract.invoke(&tx, invocation) {
            Ok(payload) => {
                if invocation.is_read_only() {
                    tx.rollback();
                    debug!("Query {} answered", invocation);
                } else {
                    let version = tx.commit()?;
                    *self.committed.write() += 1;
                    info!("Committed {} at {}", invocation, version);
                }
                Ok(payload)
            }
            Err(e) => {
                tx.rollback();
                warn!("Invocation {} failed: {}", invocation, e);
                Err(e)
            }
        }
    }

    /// Get current state version
    pub fn state_version(&self) -> StateVersion {
        self.state.version()
    }

    /// Number of records in the world state
    pub fn record_count(&self) -> LedgerResult<usize> {
        self.state.len()
    }

    /// Transactions committed since start
    pub fn committed_transactions(&self) -> u64 {
        *self.committed.read()
    }

    /// Get config reference
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get state reference
    pub fn state(&self) -> &SharedStateStore {
        &self.state
    }

    /// Get contract reference
    pub fn contract(&self) -> &ItemContract {
        &self.contract
    }
}

/// Decode a JSON response payload; empty payloads become `null`
pub fn payload_to_json(payload: &[u8]) -> LedgerResult<serde_json::Value> {
    if payload.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(payload).map_err(|e| LedgerError::DeserializationError(e.to_string()))
}
