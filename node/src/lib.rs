//! ITEMLEDGER Node Implementation
//!
//! Hosts the item contract:
//! - World-state backend (memory or sled)
//! - One transaction per invocation, committed on success
//! - HTTP API

mod api;
mod node;
mod runtime;

pub use api::*;
pub use node::*;
pub use runtime::*;
