// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into the ledger data types, the store lifecycle and integrity checks.

pub mod core;
pub use self::core::*;
