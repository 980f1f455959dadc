//! Core types for ITEMLEDGER
//!
//! Defines the small value types shared by the state layer and the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic version of the world state, bumped once per committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct StateVersion(pub u64);

impl StateVersion {
    pub fn new(value: u64) -> Self {
        StateVersion(value)
    }

    pub fn next(&self) -> StateVersion {
        StateVersion(self.0 + 1)
    }
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A single world-state entry as returned by range scans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// State change operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl StateChange {
    pub fn key(&self) -> &str {
        match self {
            StateChange::Set { key, .. } => key,
            StateChange::Delete { key } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_version_next() {
        let v = StateVersion::new(4);
        assert_eq!(v.next(), StateVersion(5));
        assert_eq!(v.to_string(), "v4");
    }

    #[test]
    fn test_state_change_key() {
        let set = StateChange::Set {
            key: "item1".into(),
            value: vec![1],
        };
        let delete = StateChange::Delete { key: "item2".into() };

        assert_eq!(set.key(), "item1");
        assert_eq!(delete.key(), "item2");
    }
}
