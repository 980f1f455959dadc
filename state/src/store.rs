//! Core state store traits and types

use itemledger_core::{KeyValue, LedgerResult, StateMutator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Abstract state store interface
pub trait StateStore: StateMutator {
    /// Get all entries in key order
    fn all_entries(&self) -> LedgerResult<Vec<KeyValue>> {
        self.range("", "")?.collect()
    }

    /// Number of keys currently stored
    fn len(&self) -> LedgerResult<usize>;

    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Range scans handed out and not yet released
    fn open_scans(&self) -> usize;
}

/// Counts range scans that are still open on a backend
#[derive(Debug, Clone, Default)]
pub struct ScanTracker {
    open: Arc<AtomicUsize>,
}

impl ScanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new scan; the returned hook must run when it is released
    pub fn open(&self) -> impl FnOnce() + Send + 'static {
        self.open.fetch_add(1, Ordering::SeqCst);
        let open = self.open.clone();
        move || {
            open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}
