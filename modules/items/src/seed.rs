//! Bootstrap records written by `InitLedger`

use itemledger_core::{LedgerError, LedgerResult, TransactionContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::contract::ItemContract;
use crate::item::Item;

/// The set of items a fresh ledger starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub items: Vec<Item>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            items: vec![
                Item::new("item1", "Item 1", 100),
                Item::new("item2", "Item 2", 200),
                Item::new("item3", "Item 3", 300),
            ],
        }
    }
}

impl SeedConfig {
    /// A seed that writes nothing
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item
    pub fn add_item(mut self, id: &str, name: &str, price: i64) -> Self {
        self.items.push(Item::new(id, name, price));
        self
    }

    /// Save to JSON
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::SerializationError(e.to_string()))
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::DeserializationError(e.to_string()))
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::ConfigError(format!("cannot read seed {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

/// Writes a [`SeedConfig`] through `CreateItem`
pub struct SeedInitializer<'a> {
    contract: &'a ItemContract,
    config: &'a SeedConfig,
}

impl<'a> SeedInitializer<'a> {
    pub fn new(contract: &'a ItemContract, config: &'a SeedConfig) -> Self {
        Self { contract, config }
    }

    /// Write every seed item, stopping at the first failure.
    ///
    /// Returns how many items were written.
    pub fn initialize(&self, ctx: &dyn TransactionContext) -> LedgerResult<usize> {
        for item in &self.config.items {
            self.contract
                .create_item(ctx, &item.id, &item.name, item.price)?;
            info!("Seed item: {}", item);
        }

        Ok(self.config.items.len())
    }
}
