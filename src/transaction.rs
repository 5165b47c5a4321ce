//! Transaction module: value and gas amounts plus the transfer record

pub mod types;

pub use types::*;
