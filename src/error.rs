//! Error types for mockscan
//!
//! Lookups never fail: a missing block, transaction or address is an
//! ordinary `None`/`NotFound` value. `ExplorerError` only covers the
//! ambient layers around the query core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Summary error: {0}")]
    Summary(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ExplorerError>;
