//! Read operations over the mock ledger
//!
//! Every call waits out a simulated network latency, makes sure the ledger
//! has been generated, and then reads from the immutable snapshot. A missing
//! block, transaction or address is reported as `None` (or
//! [`SearchOutcome::NotFound`]), never as an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{Block, Ledger, LedgerStatus, LedgerStore, ADDRESS_HEX_LEN, HASH_HEX_LEN};
use crate::cache::AddressCache;
use crate::config::ExplorerConfig;
use crate::transaction::{Ether, Transaction};

/// Aggregated view of one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub address: String,
    pub balance: String,
    pub transaction_count: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SearchOutcome {
    Block(Block),
    Transaction(Transaction),
    Address(AddressDetails),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    #[serde(flatten)]
    pub outcome: SearchOutcome,
}

impl SearchResult {
    pub fn is_found(&self) -> bool {
        !matches!(self.outcome, SearchOutcome::NotFound)
    }
}

/// What a search string looks like. Classification says nothing about
/// whether the target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    BlockNumber(u64),
    Address,
    Hash,
    Unrecognized,
}

impl QueryShape {
    pub fn classify(query: &str) -> Self {
        if !query.is_empty() && query.bytes().all(|b| b.is_ascii_digit()) {
            // digit strings too large for a block id cannot match any block
            return query
                .parse()
                .map(QueryShape::BlockNumber)
                .unwrap_or(QueryShape::Unrecognized);
        }

        match prefixed_hex_len(query) {
            Some(ADDRESS_HEX_LEN) => QueryShape::Address,
            Some(HASH_HEX_LEN) => QueryShape::Hash,
            _ => QueryShape::Unrecognized,
        }
    }
}

/// Number of hex digits after a lowercase `0x` prefix, if the rest is all hex.
fn prefixed_hex_len(query: &str) -> Option<usize> {
    let digits = query.strip_prefix("0x")?;
    digits
        .bytes()
        .all(|b| b.is_ascii_hexdigit())
        .then_some(digits.len())
}

/// Simulated round-trip times per operation class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub list: Duration,
    pub lookup: Duration,
    pub search: Duration,
}

impl SimulatedLatency {
    pub const NONE: SimulatedLatency = SimulatedLatency {
        list: Duration::ZERO,
        lookup: Duration::ZERO,
        search: Duration::ZERO,
    };

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self {
            list: config.list_latency(),
            lookup: config.lookup_latency(),
            search: config.search_latency(),
        }
    }
}

async fn simulate(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Query front end shared by the API and the CLI.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<LedgerStore>,
    addresses: AddressCache,
    latency: SimulatedLatency,
    history_limit: usize,
}

impl QueryService {
    pub const DEFAULT_HISTORY_LIMIT: usize = 20;

    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            addresses: AddressCache::new(AddressCache::DEFAULT_CAPACITY),
            latency: SimulatedLatency::NONE,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn from_config(store: Arc<LedgerStore>, config: &ExplorerConfig) -> Self {
        Self {
            store,
            addresses: AddressCache::new(config.address_cache_capacity),
            latency: SimulatedLatency::from_config(config),
            history_limit: config.address_history_limit,
        }
    }

    pub fn with_latency(mut self, latency: SimulatedLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn ledger_status(&self) -> LedgerStatus {
        self.store.status()
    }

    pub fn address_cache(&self) -> &AddressCache {
        &self.addresses
    }

    fn ledger(&self) -> Arc<Ledger> {
        self.store.ensure_initialized()
    }

    pub async fn latest_blocks(&self, count: usize) -> Vec<Block> {
        simulate(self.latency.list).await;
        self.ledger().latest_blocks(count)
    }

    pub async fn latest_transactions(&self, count: usize) -> Vec<Transaction> {
        simulate(self.latency.list).await;
        self.ledger().latest_transactions(count)
    }

    pub async fn block_by_id(&self, id: u64) -> Option<Block> {
        simulate(self.latency.lookup).await;
        self.ledger().block(id).cloned()
    }

    pub async fn block_by_hash(&self, hash: &str) -> Option<Block> {
        simulate(self.latency.lookup).await;
        self.ledger().block_by_hash(hash).cloned()
    }

    pub async fn transaction_by_hash(&self, hash: &str) -> Option<Transaction> {
        simulate(self.latency.lookup).await;
        self.ledger().transaction(hash).cloned()
    }

    pub async fn address_details(&self, address: &str) -> Option<AddressDetails> {
        simulate(self.latency.lookup).await;
        self.resolve_address(&self.ledger(), address).await
    }

    /// Resolves a free-text query. Numbers are block ids, `0x` + 40 hex is an
    /// address, `0x` + 64 hex is a transaction hash and then a block hash.
    pub async fn search(&self, query: &str) -> SearchResult {
        simulate(self.latency.search).await;
        let ledger = self.ledger();
        let query = query.trim();

        let outcome = match QueryShape::classify(query) {
            QueryShape::BlockNumber(id) => ledger.block(id).cloned().map(SearchOutcome::Block),
            QueryShape::Address => self
                .resolve_address(&ledger, query)
                .await
                .map(SearchOutcome::Address),
            QueryShape::Hash => ledger
                .transaction(query)
                .cloned()
                .map(SearchOutcome::Transaction)
                .or_else(|| ledger.block_by_hash(query).cloned().map(SearchOutcome::Block)),
            QueryShape::Unrecognized => None,
        };

        SearchResult {
            query: query.to_string(),
            outcome: outcome.unwrap_or(SearchOutcome::NotFound),
        }
    }

    async fn resolve_address(&self, ledger: &Ledger, address: &str) -> Option<AddressDetails> {
        if let Some(mut cached) = self.addresses.lookup(address).await {
            cached.address = address.to_string();
            return Some(cached);
        }

        let details = aggregate_address(ledger, address, self.history_limit)?;
        self.addresses.store(&details).await;
        Some(details)
    }
}

/// Balance, activity count and recent history for `address`. Unknown when
/// the address never sent, received or mined.
pub fn aggregate_address(ledger: &Ledger, address: &str, history_limit: usize) -> Option<AddressDetails> {
    let involved = ledger.transactions_involving(address);

    if involved.is_empty() && !ledger.is_miner(address) {
        return None;
    }

    let balance = involved
        .iter()
        .fold(Ether::ZERO, |sum, tx| sum + tx.net_value_for(address));

    Some(AddressDetails {
        address: address.to_string(),
        balance: balance.to_balance_string(),
        transaction_count: involved.len(),
        transactions: involved.into_iter().take(history_limit).cloned().collect(),
    })
}
