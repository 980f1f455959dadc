//! Item record and its ledger encoding

use itemledger_core::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single managed record. `id` is also the world-state key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: i64,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }

    /// JSON with `id`, `name` and `price` fields
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.id, self.name, self.price)
    }
}

pub(crate) fn encode(op: &'static str, item: &Item) -> LedgerResult<Vec<u8>> {
    item.to_bytes().map_err(|e| LedgerError::Encode {
        op,
        key: item.id.clone(),
        reason: e.to_string(),
    })
}

pub(crate) fn decode(op: &'static str, key: &str, bytes: &[u8]) -> LedgerResult<Item> {
    Item::from_bytes(bytes).map_err(|e| LedgerError::MalformedRecord {
        op,
        key: key.to_string(),
        reason: e.to_string(),
    })
}
