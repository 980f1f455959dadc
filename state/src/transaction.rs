//! Buffered world-state transactions
//!
//! A [`LedgerTransaction`] is the [`TransactionContext`] a contract runs
//! against. Writes are staged in memory and become visible to the backend
//! only through [`LedgerTransaction::commit`], as a single atomic batch.
//! Reads inside the transaction see its own staged writes.

use itemledger_core::{
    key_in_range, validate_key, KeyValue, LedgerResult, StateChange, StateIterator, StateMutator,
    StateVersion, TransactionContext,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::vec;
use tracing::debug;

/// Staged write: `Some` for a put, `None` for a delete
type PendingWrite = Option<Vec<u8>>;

/// One transaction over a state backend
pub struct LedgerTransaction<'s, S: StateMutator + ?Sized> {
    store: &'s S,
    writes: RefCell<BTreeMap<String, PendingWrite>>,
}

impl<'s, S: StateMutator + ?Sized> LedgerTransaction<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            writes: RefCell::new(BTreeMap::new()),
        }
    }

    /// Number of keys touched by this transaction
    pub fn pending_changes(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.borrow().is_empty()
    }

    /// The staged writes in key order, as backend changes
    pub fn changes(&self) -> Vec<StateChange> {
        self.writes
            .borrow()
            .iter()
            .map(|(key, write)| match write {
                Some(value) => StateChange::Set {
                    key: key.clone(),
                    value: value.clone(),
                },
                None => StateChange::Delete { key: key.clone() },
            })
            .collect()
    }

    /// Apply all staged writes to the backend as one batch.
    ///
    /// A transaction without writes leaves the backend version untouched.
    pub fn commit(self) -> LedgerResult<StateVersion> {
        let changes = self.changes();
        if changes.is_empty() {
            return Ok(self.store.version());
        }

        let count = changes.len();
        let version = self.store.apply_batch(changes)?;
        debug!("Committed {} change(s) at {}", count, version);
        Ok(version)
    }

    /// Discard all staged writes
    pub fn rollback(self) {
        let discarded = self.writes.borrow().len();
        if discarded > 0 {
            debug!("Rolled back {} staged change(s)", discarded);
        }
    }
}

impl<S: StateMutator + ?Sized> TransactionContext for LedgerTransaction<'_, S> {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        validate_key(key)?;
        if let Some(write) = self.writes.borrow().get(key) {
            return Ok(write.clone());
        }
        self.store.get(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        validate_key(key)?;
        self.writes
            .borrow_mut()
            .insert(key.to_string(), Some(value.to_vec()));
        Ok(())
    }

    fn del_state(&self, key: &str) -> LedgerResult<()> {
        validate_key(key)?;
        self.writes.borrow_mut().insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIterator<'_>> {
        let base = self.store.range(start, end)?;
        let staged: Vec<(String, PendingWrite)> = self
            .writes
            .borrow()
            .iter()
            .filter(|(key, _)| key_in_range(key, start, end))
            .map(|(key, write)| (key.clone(), write.clone()))
            .collect();

        Ok(StateIterator::new(OverlayScan {
            base: base.peekable(),
            staged: staged.into_iter().peekable(),
        }))
    }
}

/// Merges a backend scan with the transaction's staged writes.
///
/// Both inputs are sorted by key; a staged write shadows the backend entry
/// with the same key, and a staged delete hides it. Dropping the overlay
/// drops the backend scan with it.
struct OverlayScan<'a> {
    base: Peekable<StateIterator<'a>>,
    staged: Peekable<vec::IntoIter<(String, PendingWrite)>>,
}

impl Iterator for OverlayScan<'_> {
    type Item = LedgerResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let base_key = match self.base.peek() {
                Some(Ok(kv)) => Some(kv.key.clone()),
                Some(Err(_)) => return self.base.next(),
                None => None,
            };
            let staged_key = self.staged.peek().map(|(key, _)| key.clone());

            let take_staged = match (&base_key, &staged_key) {
                (None, None) => return None,
                (Some(_), None) => return self.base.next(),
                (None, Some(_)) => true,
                (Some(b), Some(s)) if b < s => return self.base.next(),
                (Some(b), Some(s)) => {
                    if b == s {
                        // shadowed
                        self.base.next();
                    }
                    true
                }
            };

            if take_staged {
                if let Some((key, Some(value))) = self.staged.next() {
                    return Some(Ok(KeyValue::new(key, value)));
                }
            }
        }
    }
}
