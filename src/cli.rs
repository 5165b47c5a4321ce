//! Shared setup for the command-line binaries

use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::LedgerStore;
use crate::config::{load_config, Config};
use crate::error::Result;
use crate::generator::LedgerGenerator;
use crate::query::QueryService;
use crate::summary::{provider_from_config, SummaryProvider};

/// Query service over a lazily generated ledger shaped by `config`.
pub fn build_query_service(config: &Config) -> QueryService {
    let generator = LedgerGenerator::from_config(&config.ledger);
    let store = Arc::new(LedgerStore::new(generator));
    QueryService::from_config(store, &config.explorer)
}

pub fn build_summary_provider(config: &Config) -> Arc<dyn SummaryProvider> {
    provider_from_config(&config.summary)
}

/// Loads configuration and builds the query service in one step.
pub fn load_service_from_config() -> Result<(Config, QueryService)> {
    let config = load_config()?;
    let service = build_query_service(&config);
    Ok((config, service))
}

/// Shortens long hex strings for table output: `0x1234…cdef`.
pub fn abbreviate(value: &str, head: usize, tail: usize) -> String {
    if value.len() <= head + tail + 1 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}…{}", &value[..head], &value[value.len() - tail..])
}

/// Humanized time since `timestamp`, e.g. `"2m 5s ago"`.
pub fn age(timestamp: u64) -> String {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(timestamp);
    age_at(timestamp, now)
}

pub fn age_at(timestamp: u64, now: u64) -> String {
    let elapsed = Duration::from_secs(now.saturating_sub(timestamp));
    format!("{} ago", humantime::format_duration(elapsed))
}
