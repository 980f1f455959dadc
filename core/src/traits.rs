//! Core traits defining ITEMLEDGER interfaces
//!
//! Backends implement [`StateProvider`] and [`StateMutator`]. Contract code
//! only ever sees a [`TransactionContext`], the capability the host hands
//! to each invocation.

use crate::error::LedgerError;
use crate::types::*;
use std::ops::Bound;

/// Result type for ITEMLEDGER operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Read access to a world-state backend
pub trait StateProvider: Send + Sync {
    /// Get the current state version
    fn version(&self) -> StateVersion;

    /// Get a value by key
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Check if a key exists
    fn exists(&self, key: &str) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan `[start, end)` in ascending key order. An empty bound is open.
    fn range(&self, start: &str, end: &str) -> LedgerResult<StateIterator<'_>>;
}

/// Write access to a world-state backend
pub trait StateMutator: StateProvider {
    /// Set a value
    fn set(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Delete a key
    fn delete(&self, key: &str) -> LedgerResult<()>;

    /// Apply a batch of changes atomically
    fn apply_batch(&self, changes: Vec<StateChange>) -> LedgerResult<StateVersion>;
}

/// World-state access granted to a contract for the duration of one invocation
pub trait TransactionContext {
    /// Read the value under `key`, `None` when absent
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value
    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn del_state(&self, key: &str) -> LedgerResult<()>;

    /// Scan `[start, end)` in ascending key order. An empty bound is open.
    fn get_state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIterator<'_>>;
}

/// Iterator over a range scan.
///
/// Holds whatever the backend needs to keep the scan alive. The release hook
/// runs exactly once, on [`StateIterator::close`] or on drop, whichever
/// comes first.
pub struct StateIterator<'a> {
    entries: Box<dyn Iterator<Item = LedgerResult<KeyValue>> + 'a>,
    release: Option<Box<dyn FnOnce() + 'a>>,
    closed: bool,
}

impl<'a> StateIterator<'a> {
    pub fn new<I>(entries: I) -> Self
    where
        I: Iterator<Item = LedgerResult<KeyValue>> + 'a,
    {
        Self {
            entries: Box::new(entries),
            release: None,
            closed: false,
        }
    }

    /// Iterator over an already materialized set of entries
    pub fn from_entries(entries: Vec<KeyValue>) -> Self {
        Self::new(entries.into_iter().map(Ok))
    }

    /// Attach a hook that runs when the iterator is released
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Release the scan before it is exhausted
    pub fn close(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        self.closed = true;
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Iterator for StateIterator<'_> {
    type Item = LedgerResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.entries.next()
    }
}

impl Drop for StateIterator<'_> {
    fn drop(&mut self) {
        self.release_now();
    }
}

/// Translate a `[start, end)` scan request into `BTreeMap` bounds.
///
/// Returns `None` when the range is empty (`start >= end` with both set).
pub fn scan_bounds(start: &str, end: &str) -> Option<(Bound<String>, Bound<String>)> {
    if !start.is_empty() && !end.is_empty() && start >= end {
        return None;
    }
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start.to_string())
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end.to_string())
    };
    Some((lower, upper))
}

/// Check a key against a `[start, end)` scan request
pub fn key_in_range(key: &str, start: &str, end: &str) -> bool {
    (start.is_empty() || key >= start) && (end.is_empty() || key < end)
}

/// Reject keys the ledger cannot store
pub fn validate_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::Storage("key must not be an empty string".into()));
    }
    Ok(())
}
