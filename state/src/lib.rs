//! ITEMLEDGER State Management
//!
//! Provides world-state storage and the transactions contracts run in.
//! Uses a key-value model where state = { key → value }, ordered by key.

pub mod store;
pub mod memory;
pub mod persistent;
pub mod transaction;

pub use store::*;
pub use memory::*;
pub use persistent::*;
pub use transaction::*;
