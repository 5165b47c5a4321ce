//! Configuration management for mockscan

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ExplorerError, Result};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Shape of the generated mock ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_transaction_count")]
    pub transaction_count: usize,
    #[serde(default = "default_block_count")]
    pub block_count: usize,
    /// Fixed seed for reproducible datasets. Entropy is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transaction_count: default_transaction_count(),
            block_count: default_block_count(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_latest_items_count")]
    pub latest_items_count: usize,
    #[serde(default = "default_address_history_limit")]
    pub address_history_limit: usize,
    #[serde(default = "default_address_cache_capacity")]
    pub address_cache_capacity: usize,
    #[serde(default = "default_list_latency_ms")]
    pub list_latency_ms: u64,
    #[serde(default = "default_lookup_latency_ms")]
    pub lookup_latency_ms: u64,
    #[serde(default = "default_search_latency_ms")]
    pub search_latency_ms: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            latest_items_count: default_latest_items_count(),
            address_history_limit: default_address_history_limit(),
            address_cache_capacity: default_address_cache_capacity(),
            list_latency_ms: default_list_latency_ms(),
            lookup_latency_ms: default_lookup_latency_ms(),
            search_latency_ms: default_search_latency_ms(),
        }
    }
}

impl ExplorerConfig {
    pub fn list_latency(&self) -> Duration {
        Duration::from_millis(self.list_latency_ms)
    }

    pub fn lookup_latency(&self) -> Duration {
        Duration::from_millis(self.lookup_latency_ms)
    }

    pub fn search_latency(&self) -> Duration {
        Duration::from_millis(self.search_latency_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

/// Settings for the optional AI summary provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SummaryConfig {
    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_transaction_count() -> usize {
    20
}

fn default_block_count() -> usize {
    10
}

fn default_latest_items_count() -> usize {
    5
}

fn default_address_history_limit() -> usize {
    20
}

fn default_address_cache_capacity() -> usize {
    256
}

fn default_list_latency_ms() -> u64 {
    300
}

fn default_lookup_latency_ms() -> u64 {
    500
}

fn default_search_latency_ms() -> u64 {
    600
}

fn default_api_port() -> u16 {
    3000
}

fn default_model() -> String {
    "gemini-2.5-flash-preview-04-17".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Loads `config.toml` from the working directory, then from the user
/// config directory. Falls back to defaults when neither exists.
pub fn load_config() -> Result<Config> {
    let candidates: Vec<PathBuf> = std::iter::once(PathBuf::from(CONFIG_FILE_NAME))
        .chain(dirs::config_dir().map(|dir| dir.join("mockscan").join(CONFIG_FILE_NAME)))
        .collect();

    match candidates.iter().find(|path| path.is_file()) {
        Some(path) => load_config_from(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path.as_ref())?;
    let config: Config = toml::from_str(&config_str)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.ledger.block_count == 0 {
        return Err(ExplorerError::Config(
            "ledger.block_count must be at least 1".to_string(),
        ));
    }

    if config.explorer.latest_items_count == 0 {
        return Err(ExplorerError::Config(
            "explorer.latest_items_count must be at least 1".to_string(),
        ));
    }

    if config.summary.model.trim().is_empty() {
        return Err(ExplorerError::Config(
            "summary.model must not be empty".to_string(),
        ));
    }

    Ok(())
}
