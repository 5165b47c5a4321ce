use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// Hex characters in a block or transaction hash, without the `0x` prefix.
pub const HASH_HEX_LEN: usize = 64;
/// Hex characters in an address, without the `0x` prefix.
pub const ADDRESS_HEX_LEN: usize = 40;
/// Gas limit shared by every block.
pub const BLOCK_GAS_LIMIT: u64 = 15_000_000;

pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: u64,
    pub timestamp: u64,
    pub miner: String,
    pub hash: String,
    pub parent_hash: String,
    pub transaction_hashes: Vec<String>,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub size: u64,
}

impl Block {
    pub fn transaction_count(&self) -> usize {
        self.transaction_hashes.len()
    }

    pub fn contains_transaction(&self, hash: &str) -> bool {
        self.transaction_hashes.iter().any(|h| h == hash)
    }

    /// Digest over the block contents plus a caller supplied salt. The salt
    /// keeps hashes unique between blocks with identical contents.
    pub fn digest(
        id: u64,
        timestamp: u64,
        miner: &str,
        transaction_hashes: &[String],
        salt: &[u8],
    ) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(id.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(miner.as_bytes());
        for tx_hash in transaction_hashes {
            hasher.update(tx_hash.as_bytes());
        }
        hasher.update(salt);
        hasher.finalize().into()
    }
}

/// The generated dataset. Blocks are stored by ascending id, transactions
/// newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub blocks: Vec<Block>,
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(blocks: Vec<Block>, transactions: Vec<Transaction>) -> Self {
        Self {
            blocks,
            transactions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.transactions.is_empty()
    }

    pub fn block(&self, id: u64) -> Option<&Block> {
        // ids are dense, so the position is the fast path
        usize::try_from(id)
            .ok()
            .and_then(|index| self.blocks.get(index))
            .filter(|block| block.id == id)
            .or_else(|| self.blocks.iter().find(|block| block.id == id))
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.hash == hash)
    }

    pub fn transaction(&self, hash: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.hash == hash)
    }

    /// The `count` blocks with the highest ids, highest first.
    pub fn latest_blocks(&self, count: usize) -> Vec<Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by(|a, b| b.id.cmp(&a.id));
        blocks.into_iter().take(count).cloned().collect()
    }

    /// The `count` most recent transactions. Equal timestamps keep storage
    /// order.
    pub fn latest_transactions(&self, count: usize) -> Vec<Transaction> {
        let mut transactions: Vec<&Transaction> = self.transactions.iter().collect();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.into_iter().take(count).cloned().collect()
    }

    pub fn pending_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| tx.is_pending())
    }

    pub fn is_miner(&self, address: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| block.miner.eq_ignore_ascii_case(address))
    }

    /// Transactions sent or received by `address`, newest first. Equal
    /// timestamps keep storage order.
    pub fn transactions_involving(&self, address: &str) -> Vec<&Transaction> {
        let mut involved: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|tx| tx.involves(address))
            .collect();
        involved.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        involved
    }
}
