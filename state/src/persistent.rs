//! Persistent state store using sled database

use itemledger_core::{
    scan_bounds, validate_key, KeyValue, LedgerError, LedgerResult, StateChange, StateIterator,
    StateMutator, StateProvider, StateVersion,
};
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional, Tree};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::memory::MemoryStateStore;
use crate::store::{ScanTracker, StateStore};

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const VERSION_KEY: &[u8] = b"version";

fn storage_err(err: sled::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

/// Persistent state store backed by sled database
pub struct PersistentStateStore {
    _db: Db,
    state: Tree,
    meta: Tree,
    version: RwLock<StateVersion>,
    scans: ScanTracker,
}

impl PersistentStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let db = sled::open(path).map_err(storage_err)?;

        let state = db.open_tree(STATE_TREE).map_err(storage_err)?;
        let meta = db.open_tree(META_TREE).map_err(storage_err)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(storage_err)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    LedgerError::Storage("corrupt state version in meta tree".into())
                })?;
                StateVersion::new(u64::from_le_bytes(raw))
            }
            None => StateVersion::new(0),
        };

        debug!("Opened persistent state at {}", version);

        Ok(Self {
            _db: db,
            state,
            meta,
            version: RwLock::new(version),
            scans: ScanTracker::new(),
        })
    }

    /// Copy the current state into a memory store
    pub fn snapshot(&self) -> LedgerResult<MemoryStateStore> {
        let data = self
            .all_entries()?
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        Ok(MemoryStateStore::with_data(data))
    }
}

impl StateProvider for PersistentStateStore {
    fn version(&self) -> StateVersion {
        *self.version.read()
    }

    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.state
            .get(key.as_bytes())
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(storage_err)
    }

    fn exists(&self, key: &str) -> LedgerResult<bool> {
        self.state.contains_key(key.as_bytes()).map_err(storage_err)
    }

    fn range(&self, start: &str, end: &str) -> LedgerResult<StateIterator<'_>> {
        let Some((lower, upper)) = scan_bounds(start, end) else {
            return Ok(StateIterator::from_entries(Vec::new()).on_release(self.scans.open()));
        };

        let lower = map_bound(lower);
        let upper = map_bound(upper);

        let entries = self.state.range((lower, upper)).map(|result| -> LedgerResult<KeyValue> {
            let (key, value) = result.map_err(storage_err)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| LedgerError::Storage(format!("non-utf8 key in state tree: {}", e)))?;
            Ok(KeyValue::new(key, value.to_vec()))
        });

        Ok(StateIterator::new(entries).on_release(self.scans.open()))
    }
}

fn map_bound(bound: Bound<String>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(key) => Bound::Included(key.into_bytes()),
        Bound::Excluded(key) => Bound::Excluded(key.into_bytes()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl StateMutator for PersistentStateStore {
    fn set(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        validate_key(key)?;
        self.state.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.state.remove(key.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    fn apply_batch(&self, changes: Vec<StateChange>) -> LedgerResult<StateVersion> {
        for change in &changes {
            validate_key(change.key())?;
        }

        let mut version = self.version.write();
        let new_version = version.next();

        let mut batch = sled::Batch::default();
        for change in changes {
            match change {
                StateChange::Set { key, value } => batch.insert(key.as_bytes(), value),
                StateChange::Delete { key } => batch.remove(key.as_bytes()),
            }
        }

        // State writes and the version land in one multi-tree transaction
        (&self.state, &self.meta)
            .transaction(|(state, meta)| -> ConflictableTransactionResult<()> {
                state.apply_batch(&batch)?;
                meta.insert(VERSION_KEY, new_version.0.to_le_bytes().to_vec())?;
                state.flush();
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => {
                    LedgerError::Storage(format!("commit of {} aborted", new_version))
                }
                TransactionError::Storage(err) => storage_err(err),
            })?;

        *version = new_version;
        Ok(new_version)
    }
}

impl StateStore for PersistentStateStore {
    fn len(&self) -> LedgerResult<usize> {
        Ok(self.state.len())
    }

    fn open_scans(&self) -> usize {
        self.scans.count()
    }
}

/// Thread-safe persistent store wrapper
pub type SharedPersistentStateStore = Arc<PersistentStateStore>;

/// Create a shared persistent state store
pub fn create_persistent_store<P: AsRef<Path>>(path: P) -> LedgerResult<SharedPersistentStateStore> {
    Ok(Arc::new(PersistentStateStore::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persistent_store_basic() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();

        store.set("key1", b"value1").unwrap();
        let value = store.get("key1").unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        store.delete("key1").unwrap();
        let value = store.get("key1").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_persistent_store_reopen() {
        let tmp = TempDir::new().unwrap();

        // Write data
        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            store.set("key1", b"value1").unwrap();
            let changes = vec![StateChange::Set {
                key: "k2".into(),
                value: b"v2".to_vec(),
            }];
            store.apply_batch(changes).unwrap();
        }

        // Reopen and verify
        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));
            assert_eq!(store.get("k2").unwrap(), Some(b"v2".to_vec()));
            assert_eq!(store.version().0, 1);
        }
    }

    #[test]
    fn test_persistent_store_range() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();

        for key in ["item2", "item3", "item1", "other"] {
            store.set(key, key.as_bytes()).unwrap();
        }

        let keys: Vec<String> = store
            .range("", "")
            .unwrap()
            .map(|kv| kv.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["item1", "item2", "item3", "other"]);

        let keys: Vec<String> = store
            .range("item1", "item3")
            .unwrap()
            .map(|kv| kv.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["item1", "item2"]);
        assert_eq!(store.open_scans(), 0);
    }

    #[test]
    fn test_persistent_batches_commit_state_with_version() {
        let tmp = TempDir::new().unwrap();

        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            store.set("gone", b"x").unwrap();
            for i in 1..=3u64 {
                let version = store
                    .apply_batch(vec![
                        StateChange::Set {
                            key: format!("item{}", i),
                            value: i.to_string().into_bytes(),
                        },
                        StateChange::Delete { key: "gone".into() },
                    ])
                    .unwrap();
                assert_eq!(version.0, i);
            }

            // A batch with an empty key is refused before anything is written
            let bad = vec![
                StateChange::Set {
                    key: "item9".into(),
                    value: b"9".to_vec(),
                },
                StateChange::Delete { key: String::new() },
            ];
            assert!(store.apply_batch(bad).is_err());
            assert_eq!(store.version().0, 3);
        }

        let store = PersistentStateStore::open(tmp.path()).unwrap();
        assert_eq!(store.version().0, 3);
        assert_eq!(store.len().unwrap(), 3);
        assert!(!store.exists("gone").unwrap());
        assert!(!store.exists("item9").unwrap());
        assert_eq!(store.get("item2").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_persistent_store_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();
        store.set("a", b"1").unwrap();

        let snapshot = store.snapshot().unwrap();
        store.set("b", b"2").unwrap();

        assert_eq!(snapshot.len().unwrap(), 1);
        assert_eq!(store.len().unwrap(), 2);
    }
}
