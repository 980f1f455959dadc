//! Item Contract Module for ITEMLEDGER
//!
//! Manages `Item` records in the world state:
//! - Create, read, update, delete and existence checks by id
//! - Full enumeration in key order
//! - Bootstrap seeding (`InitLedger`)
//! - Named-function dispatch for the host

pub mod item;
pub mod contract;
pub mod seed;
pub mod invoke;

pub use item::Item;
pub use contract::*;
pub use seed::*;
pub use invoke::*;
