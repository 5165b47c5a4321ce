// core.rs splits the ledger into data, lifecycle and integrity checks.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
