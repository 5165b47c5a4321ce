//! Mock ledger generation
//!
//! Builds a fixed-size dataset whose cross references hold together:
//! transactions are handed out to blocks from the newest end, blocks link to
//! their predecessor by hash, and assigned transactions never postdate their
//! block. Transactions left over once every block is filled stay pending.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::blockchain::{to_prefixed_hex, Block, Ledger, BLOCK_GAS_LIMIT};
use crate::config::LedgerConfig;
use crate::transaction::{Ether, Gwei, Transaction, TxStatus};

/// Transactions are timestamped within this trailing window.
pub const TRAILING_WINDOW_SECS: u64 = 86_400 * 30;
/// Nominal spacing between consecutive blocks.
pub const BLOCK_INTERVAL_SECS: u64 = 15;
/// Probability that a generated transaction succeeded.
pub const SUCCESS_RATE: f64 = 0.9;

pub struct LedgerGenerator {
    rng: StdRng,
    transaction_count: usize,
    block_count: usize,
    clock: Option<u64>,
}

impl LedgerGenerator {
    /// Generator seeded from OS entropy and reading the wall clock.
    pub fn new(transaction_count: usize, block_count: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            transaction_count,
            block_count,
            clock: None,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        let generator = Self::new(config.transaction_count, config.block_count);
        match config.seed {
            Some(seed) => generator.with_seed(seed),
            None => generator,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Pins "now" so seeded runs produce identical timestamps.
    pub fn with_clock(mut self, now: u64) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn generate(&mut self) -> Ledger {
        let now = self
            .clock
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);

        let mut transactions: Vec<Transaction> = (0..self.transaction_count)
            .map(|_| self.random_transaction(now))
            .collect();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut blocks = self.assemble_blocks(now, &mut transactions);

        // generation ran newest first; store oldest first
        blocks.reverse();
        self.link_parents(&mut blocks);

        for tx in transactions.iter_mut() {
            let Some(block) = tx
                .block_id
                .and_then(|id| usize::try_from(id).ok())
                .and_then(|index| blocks.get(index))
            else {
                continue;
            };
            tx.timestamp = block.timestamp.saturating_sub(self.rng.gen_range(0..5));
        }
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ledger::new(blocks, transactions)
    }

    /// Fills blocks newest first from the front of the transaction pool.
    fn assemble_blocks(&mut self, now: u64, pool: &mut [Transaction]) -> Vec<Block> {
        let average_per_block = if self.block_count == 0 {
            0.0
        } else {
            self.transaction_count as f64 / self.block_count as f64
        };
        let mut next_tx = 0;
        let mut blocks = Vec::with_capacity(self.block_count);

        for i in 0..self.block_count {
            let id = (self.block_count - 1 - i) as u64;
            let timestamp =
                now.saturating_sub(i as u64 * BLOCK_INTERVAL_SECS + self.rng.gen_range(0..5));
            let draw = (self.rng.gen::<f64>() * average_per_block).floor() as usize + 1;

            let mut transaction_hashes = Vec::with_capacity(draw);
            for tx in pool.iter_mut().skip(next_tx).take(draw) {
                tx.block_id = Some(id);
                tx.timestamp = timestamp.saturating_sub(self.rng.gen_range(0..10));
                transaction_hashes.push(tx.hash.clone());
            }
            next_tx += transaction_hashes.len();

            let miner = self.random_address();
            let salt: [u8; 32] = self.rng.gen();
            let hash = to_prefixed_hex(&Block::digest(
                id,
                timestamp,
                &miner,
                &transaction_hashes,
                &salt,
            ));

            blocks.push(Block {
                id,
                timestamp,
                miner,
                hash,
                parent_hash: String::new(),
                transaction_hashes,
                gas_used: self.rng.gen_range(5_000_000..15_000_000),
                gas_limit: BLOCK_GAS_LIMIT,
                size: self.rng.gen_range(10_000..60_000),
            });
        }

        blocks
    }

    /// Expects blocks in ascending id order.
    fn link_parents(&mut self, blocks: &mut [Block]) {
        for index in 0..blocks.len() {
            let parent_hash = match index {
                0 => self.random_hash(),
                _ => blocks[index - 1].hash.clone(),
            };
            blocks[index].parent_hash = parent_hash;
        }
    }

    fn random_transaction(&mut self, now: u64) -> Transaction {
        let from = self.random_address();
        let to = self.random_address();
        let value = Ether::from_hundredths(self.rng.gen_range(0..=1_000));
        let gas_price = Gwei(self.rng.gen_range(5..55));
        let gas_used: u64 = self.rng.gen_range(21_000..121_000);
        let timestamp = now.saturating_sub(self.rng.gen_range(0..TRAILING_WINDOW_SECS));
        let status = if self.rng.gen_bool(SUCCESS_RATE) {
            TxStatus::Success
        } else {
            TxStatus::Failed
        };

        let mut hasher = Sha256::new();
        hasher.update(from.as_bytes());
        hasher.update(to.as_bytes());
        hasher.update(value.hundredths().to_le_bytes());
        hasher.update(gas_price.0.to_le_bytes());
        hasher.update(gas_used.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(self.rng.gen::<u64>().to_le_bytes());
        let hash = to_prefixed_hex(&hasher.finalize());

        Transaction {
            hash,
            block_id: None,
            from,
            to,
            value,
            gas_price,
            gas_used,
            timestamp,
            status,
        }
    }

    fn random_address(&mut self) -> String {
        to_prefixed_hex(&self.rng.gen::<[u8; 20]>())
    }

    fn random_hash(&mut self) -> String {
        to_prefixed_hex(&self.rng.gen::<[u8; 32]>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{validate_ledger, ADDRESS_HEX_LEN, HASH_HEX_LEN};

    const NOW: u64 = 1_700_000_000;

    fn seeded(seed: u64) -> LedgerGenerator {
        LedgerGenerator::new(20, 10).with_seed(seed).with_clock(NOW)
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let first = seeded(42).generate();
        let second = seeded(42).generate();
        assert_eq!(first, second);

        let other = seeded(43).generate();
        assert_ne!(first, other);
    }

    #[test]
    fn test_generated_ledger_shape() {
        let ledger = seeded(7).generate();
        assert_eq!(ledger.blocks.len(), 10);
        assert_eq!(ledger.transactions.len(), 20);

        for (index, block) in ledger.blocks.iter().enumerate() {
            assert_eq!(block.id, index as u64);
            assert_eq!(block.gas_limit, BLOCK_GAS_LIMIT);
            assert!((5_000_000..15_000_000).contains(&block.gas_used));
            assert!((10_000..60_000).contains(&block.size));
            assert_eq!(block.hash.len(), HASH_HEX_LEN + 2);
            assert_eq!(block.miner.len(), ADDRESS_HEX_LEN + 2);
        }

        for tx in &ledger.transactions {
            assert!(tx.hash.starts_with("0x"));
            assert_eq!(tx.hash.len(), HASH_HEX_LEN + 2);
            assert_eq!(tx.from.len(), ADDRESS_HEX_LEN + 2);
            assert!((0..=1_000).contains(&tx.value.hundredths()));
            assert!((5..55).contains(&tx.gas_price.0));
            assert!((21_000..121_000).contains(&tx.gas_used));
            assert!(tx.timestamp <= NOW);
            assert!(tx.timestamp >= NOW - TRAILING_WINDOW_SECS);
        }
    }

    #[test]
    fn test_transaction_hashes_are_unique() {
        let ledger = LedgerGenerator::new(200, 10)
            .with_seed(9)
            .with_clock(NOW)
            .generate();
        let hashes: std::collections::HashSet<&str> =
            ledger.transactions.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes.len(), 200);
        assert!(ledger
            .transactions
            .iter()
            .all(|tx| (21_000..121_000).contains(&tx.gas_used)));
    }

    #[test]
    fn test_cross_references_hold_for_many_seeds() {
        for seed in 0..50 {
            let ledger = seeded(seed).generate();
            let violations = validate_ledger(&ledger);
            assert!(violations.is_empty(), "seed {}: {:?}", seed, violations);
        }
    }

    #[test]
    fn test_newest_block_has_highest_id() {
        let ledger = seeded(3).generate();
        for pair in ledger.blocks.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
        let newest = ledger.blocks.last().unwrap();
        assert!(newest.timestamp <= NOW);
        assert!(newest.timestamp > NOW - BLOCK_INTERVAL_SECS);
    }

    #[test]
    fn test_transactions_stored_newest_first() {
        let ledger = seeded(11).generate();
        for pair in ledger.transactions.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn test_leftover_transactions_stay_pending() {
        let mut saw_pending = false;
        for seed in 0..20 {
            let ledger = seeded(seed).generate();
            let assigned: usize = ledger.blocks.iter().map(Block::transaction_count).sum();
            let pending: Vec<_> = ledger.pending_transactions().collect();
            assert_eq!(assigned + pending.len(), ledger.transactions.len());
            for tx in &pending {
                assert!(ledger.blocks.iter().all(|b| !b.contains_transaction(&tx.hash)));
            }
            saw_pending |= !pending.is_empty();
        }
        assert!(saw_pending);
    }

    #[test]
    fn test_sparse_pool_leaves_old_blocks_empty() {
        let ledger = LedgerGenerator::new(3, 10)
            .with_seed(1)
            .with_clock(NOW)
            .generate();
        // fewer transactions than blocks: one per block from the newest end
        let counts: Vec<usize> = ledger.blocks.iter().map(Block::transaction_count).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(ledger.pending_transactions().count(), 0);
    }
}
