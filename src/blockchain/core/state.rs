use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::chain::Ledger;
use super::validation::validate_ledger;
use crate::generator::LedgerGenerator;

/// Lifecycle of the dataset. `Ready` is terminal.
#[derive(Debug, Clone)]
pub enum LedgerState {
    Uninitialized,
    Generating,
    Ready(Arc<Ledger>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Uninitialized,
    Generating,
    Ready,
}

impl LedgerState {
    pub fn status(&self) -> LedgerStatus {
        match self {
            LedgerState::Uninitialized => LedgerStatus::Uninitialized,
            LedgerState::Generating => LedgerStatus::Generating,
            LedgerState::Ready(_) => LedgerStatus::Ready,
        }
    }
}

/// Owns the mock ledger and generates it exactly once.
pub struct LedgerStore {
    state: RwLock<LedgerState>,
    // serializes first-time generation; held only while not Ready
    init_lock: Mutex<Option<LedgerGenerator>>,
}

impl LedgerStore {
    pub fn new(generator: LedgerGenerator) -> Self {
        Self {
            state: RwLock::new(LedgerState::Uninitialized),
            init_lock: Mutex::new(Some(generator)),
        }
    }

    /// A store that is `Ready` from the start with the given dataset.
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            state: RwLock::new(LedgerState::Ready(Arc::new(ledger))),
            init_lock: Mutex::new(None),
        }
    }

    pub fn status(&self) -> LedgerStatus {
        self.state.read().status()
    }

    /// The dataset, if generation already completed.
    pub fn ledger(&self) -> Option<Arc<Ledger>> {
        match &*self.state.read() {
            LedgerState::Ready(ledger) => Some(Arc::clone(ledger)),
            _ => None,
        }
    }

    /// Generates the dataset on the first call and returns the same snapshot
    /// on every call after that.
    pub fn ensure_initialized(&self) -> Arc<Ledger> {
        if let Some(ledger) = self.ledger() {
            return ledger;
        }

        let mut slot = self.init_lock.lock();
        // another caller may have finished while we waited
        if let Some(ledger) = self.ledger() {
            return ledger;
        }

        let Some(generator) = slot.as_mut() else {
            // only `from_ledger` stores start without a generator, and those are Ready
            warn!("ledger store has no generator; serving an empty ledger");
            let empty = Arc::new(Ledger::default());
            *self.state.write() = LedgerState::Ready(Arc::clone(&empty));
            return empty;
        };

        *self.state.write() = LedgerState::Generating;
        let started = Instant::now();
        info!(
            transactions = generator.transaction_count(),
            blocks = generator.block_count(),
            "ledger.generate"
        );

        let ledger = Arc::new(generator.generate());

        let violations = validate_ledger(&ledger);
        if !violations.is_empty() {
            warn!(count = violations.len(), "generated ledger has integrity violations");
            for violation in &violations {
                debug!("{}", violation);
            }
        }

        info!(
            blocks = ledger.blocks.len(),
            transactions = ledger.transactions.len(),
            pending = ledger.pending_transactions().count(),
            duration_ms = %started.elapsed().as_millis(),
            "ledger.ready"
        );

        *self.state.write() = LedgerState::Ready(Arc::clone(&ledger));
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LedgerStore {
        LedgerStore::new(
            LedgerGenerator::new(20, 10)
                .with_seed(99)
                .with_clock(1_700_000_000),
        )
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let store = store();
        assert_eq!(store.status(), LedgerStatus::Uninitialized);
        assert!(store.ledger().is_none());

        let first = store.ensure_initialized();
        assert_eq!(store.status(), LedgerStatus::Ready);

        let second = store.ensure_initialized();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_concurrent_first_calls_generate_once() {
        let store = store();
        let snapshots: Vec<Arc<Ledger>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.ensure_initialized()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for snapshot in &snapshots {
            assert!(Arc::ptr_eq(snapshot, &snapshots[0]));
        }
    }

    #[test]
    fn test_status_json_uses_snake_case() {
        let json = serde_json::to_string(&LedgerStatus::Uninitialized).unwrap();
        assert_eq!(json, "\"uninitialized\"");
        let back: LedgerStatus = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(back, LedgerStatus::Ready);
    }

    #[test]
    fn test_prebuilt_store_is_ready() {
        let ledger = LedgerGenerator::new(4, 2).with_seed(1).generate();
        let store = LedgerStore::from_ledger(ledger.clone());
        assert_eq!(store.status(), LedgerStatus::Ready);
        assert_eq!(*store.ensure_initialized(), ledger);
    }
}
