//! Error types for ITEMLEDGER

use thiserror::Error;

/// Main error type for ITEMLEDGER
///
/// Contract-level variants carry the operation name and the key so a
/// failure reported by the host can be traced back to a single call.
#[derive(Error, Debug)]
pub enum LedgerError {
    // ============ Record Errors ============
    #[error("{op}: failed to encode item {key}: {reason}")]
    Encode {
        op: &'static str,
        key: String,
        reason: String,
    },

    #[error("{op}: malformed record under key {key}: {reason}")]
    MalformedRecord {
        op: &'static str,
        key: String,
        reason: String,
    },

    #[error("{op}: the item {key} does not exist")]
    NotFound { op: &'static str, key: String },

    // ============ State Errors ============
    #[error("{op}: failed to access world state for key {key}: {reason}")]
    Store {
        op: &'static str,
        key: String,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    // ============ Invocation Errors ============
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Wrap a raw backend failure with the operation and key it happened under.
    ///
    /// Errors that already carry context pass through untouched.
    pub fn in_op(self, op: &'static str, key: &str) -> Self {
        match self {
            LedgerError::Storage(reason) => LedgerError::Store {
                op,
                key: key.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError(err.to_string())
    }
}
