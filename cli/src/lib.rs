//! ITEMLEDGER CLI library
//!
//! HTTP client for the node API, used by the `itemctl` binary.

pub mod commands;

pub use commands::*;
