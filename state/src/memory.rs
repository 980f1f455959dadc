//! In-memory state store for testing and light nodes

use itemledger_core::{
    scan_bounds, validate_key, KeyValue, LedgerResult, StateChange, StateIterator, StateMutator,
    StateProvider, StateVersion,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{ScanTracker, StateStore};

/// In-memory state store
pub struct MemoryStateStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    version: RwLock<StateVersion>,
    scans: ScanTracker,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            version: RwLock::new(StateVersion::new(0)),
            scans: ScanTracker::new(),
        }
    }

    pub fn with_data(data: Vec<(String, Vec<u8>)>) -> Self {
        let store = Self::new();
        store.data.write().extend(data);
        store
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStateStore {
    fn clone(&self) -> Self {
        let new_store = Self::new();
        *new_store.data.write() = self.data.read().clone();
        *new_store.version.write() = *self.version.read();
        new_store
    }
}

impl StateProvider for MemoryStateStore {
    fn version(&self) -> StateVersion {
        *self.version.read()
    }

    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn exists(&self, key: &str) -> LedgerResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn range(&self, start: &str, end: &str) -> LedgerResult<StateIterator<'_>> {
        // The lock is not held for the life of the scan; entries are copied out.
        let entries: Vec<KeyValue> = match scan_bounds(start, end) {
            Some(bounds) => self
                .data
                .read()
                .range(bounds)
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect(),
            None => Vec::new(),
        };

        Ok(StateIterator::from_entries(entries).on_release(self.scans.open()))
    }
}

impl StateMutator for MemoryStateStore {
    fn set(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        validate_key(key)?;
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn apply_batch(&self, changes: Vec<StateChange>) -> LedgerResult<StateVersion> {
        for change in &changes {
            validate_key(change.key())?;
        }

        let mut data = self.data.write();
        let mut version = self.version.write();

        for change in changes {
            match change {
                StateChange::Set { key, value } => {
                    data.insert(key, value);
                }
                StateChange::Delete { key } => {
                    data.remove(&key);
                }
            }
        }

        *version = version.next();
        Ok(*version)
    }
}

impl StateStore for MemoryStateStore {
    fn len(&self) -> LedgerResult<usize> {
        Ok(self.data.read().len())
    }

    fn open_scans(&self) -> usize {
        self.scans.count()
    }
}

/// Thread-safe memory store wrapper
pub type SharedMemoryStateStore = Arc<MemoryStateStore>;

/// Create a shared memory state store
pub fn create_memory_store() -> SharedMemoryStateStore {
    Arc::new(MemoryStateStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStateStore::new();

        // Set and get
        store.set("key1", b"value1").unwrap();
        let value = store.get("key1").unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        // Delete
        store.delete("key1").unwrap();
        let value = store.get("key1").unwrap();
        assert_eq!(value, None);

        // Deleting again is fine
        store.delete("key1").unwrap();
    }

    #[test]
    fn test_memory_store_empty_value_is_present() {
        let store = MemoryStateStore::new();
        store.set("blank", b"").unwrap();

        assert_eq!(store.get("blank").unwrap(), Some(Vec::new()));
        assert!(store.exists("blank").unwrap());
    }

    #[test]
    fn test_memory_store_rejects_empty_key() {
        let store = MemoryStateStore::new();
        assert!(store.set("", b"v").is_err());
    }

    #[test]
    fn test_memory_store_batch() {
        let store = MemoryStateStore::new();

        let changes = vec![
            StateChange::Set {
                key: "k1".into(),
                value: b"v1".to_vec(),
            },
            StateChange::Set {
                key: "k2".into(),
                value: b"v2".to_vec(),
            },
        ];

        let version = store.apply_batch(changes).unwrap();
        assert_eq!(version.0, 1);

        assert!(store.exists("k1").unwrap());
        assert!(store.exists("k2").unwrap());
    }

    #[test]
    fn test_memory_store_batch_with_bad_key_applies_nothing() {
        let store = MemoryStateStore::new();

        let changes = vec![
            StateChange::Set {
                key: "k1".into(),
                value: b"v1".to_vec(),
            },
            StateChange::Set {
                key: String::new(),
                value: b"v2".to_vec(),
            },
        ];

        assert!(store.apply_batch(changes).is_err());
        assert!(!store.exists("k1").unwrap());
        assert_eq!(store.version().0, 0);
    }

    #[test]
    fn test_memory_store_range_order_and_bounds() {
        let store = MemoryStateStore::with_data(vec![
            ("item3".into(), b"3".to_vec()),
            ("item1".into(), b"1".to_vec()),
            ("item2".into(), b"2".to_vec()),
        ]);

        let keys: Vec<String> = store
            .range("", "")
            .unwrap()
            .map(|kv| kv.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["item1", "item2", "item3"]);

        let keys: Vec<String> = store
            .range("item2", "item3")
            .unwrap()
            .map(|kv| kv.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["item2"]);

        assert_eq!(store.range("item3", "item1").unwrap().count(), 0);
    }

    #[test]
    fn test_memory_store_tracks_open_scans() {
        let store = MemoryStateStore::with_data(vec![("a".into(), b"1".to_vec())]);

        let scan = store.range("", "").unwrap();
        assert_eq!(store.open_scans(), 1);
        scan.close();
        assert_eq!(store.open_scans(), 0);

        {
            let _scan = store.range("", "").unwrap();
            assert_eq!(store.open_scans(), 1);
        }
        assert_eq!(store.open_scans(), 0);
    }

    #[test]
    fn test_memory_store_len() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().unwrap());

        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.all_entries().unwrap().len(), 2);
    }
}
