//! Mockscan - an in-memory mock block explorer
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger snapshot, store lifecycle and integrity checks
//! - [`transaction`] - Transaction types and value units
//! - [`generator`] - Randomized, self-consistent ledger generation
//!
//! ## Queries
//! - [`query`] - Lookups, address aggregation and free-text search
//! - [`cache`] - Caching of derived address views
//!
//! ## Integration
//! - [`summary`] - Optional AI summaries behind a provider trait
//! - [`api`] - REST API (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod generator;
pub mod transaction;

// ============================================================================
// Queries
// ============================================================================
pub mod cache;
pub mod query;

// ============================================================================
// Integration
// ============================================================================
pub mod summary;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
