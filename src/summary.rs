//! AI summaries for explorer pages
//!
//! The query core never depends on this module. Presentation layers build a
//! prompt from a block, transaction or address and hand it to whichever
//! [`SummaryProvider`] is configured. Provider failures come back as text so
//! a broken or missing backend never affects lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::blockchain::Block;
use crate::config::SummaryConfig;
use crate::error::{ExplorerError, Result};
use crate::query::AddressDetails;
use crate::transaction::Transaction;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub const UNAVAILABLE_MESSAGE: &str =
    "Gemini API key not configured. AI summaries are unavailable.";

/// A citation returned alongside generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub sources: Option<Vec<GroundingSource>>,
}

impl Summary {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }
}

#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn generate_summary(&self, prompt: &str, allow_web_grounding: bool) -> Summary;
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummaryProvider;

#[async_trait]
impl SummaryProvider for DisabledSummaryProvider {
    async fn generate_summary(&self, _prompt: &str, _allow_web_grounding: bool) -> Summary {
        Summary::text_only(UNAVAILABLE_MESSAGE)
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &SummaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request(&self, prompt: &str, allow_web_grounding: bool) -> Result<Summary> {
        let body = GenerateContentRequest::new(prompt, allow_web_grounding);

        // errors are reported to API clients, so they must not carry the URL
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExplorerError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExplorerError::Summary(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExplorerError::Http(e.without_url()))?;
        parsed.into_summary()
    }
}

#[async_trait]
impl SummaryProvider for GeminiClient {
    async fn generate_summary(&self, prompt: &str, allow_web_grounding: bool) -> Summary {
        match self.request(prompt, allow_web_grounding).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(model = %self.model, "summary request failed: {}", e);
                Summary::text_only(format!("Error generating content: {}", e))
            }
        }
    }
}

/// Picks the Gemini client when an API key is present, otherwise the
/// disabled provider.
pub fn provider_from_config(config: &SummaryConfig) -> Arc<dyn SummaryProvider> {
    let Some(api_key) = config.api_key() else {
        warn!(
            env = %config.api_key_env,
            "no API key set; AI summaries are disabled"
        );
        return Arc::new(DisabledSummaryProvider);
    };

    match GeminiClient::new(api_key, config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("failed to build summary client: {}", e);
            Arc::new(DisabledSummaryProvider)
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl GenerateContentRequest {
    fn new(prompt: &str, allow_web_grounding: bool) -> Self {
        let tools = if allow_web_grounding {
            vec![Tool {
                google_search: serde_json::Map::new(),
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            tools,
        }
    }
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateContentResponse {
    fn into_summary(self) -> Result<Summary> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ExplorerError::Summary("response contained no candidates".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        let sources: Vec<GroundingSource> = candidate
            .grounding_metadata
            .map(|meta| meta.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                Some(GroundingSource {
                    uri: web.uri?,
                    title: web.title.unwrap_or_default(),
                })
            })
            .collect();

        Ok(Summary {
            text,
            sources: (!sources.is_empty()).then_some(sources),
        })
    }
}

// ============================================================================
// Prompts
// ============================================================================

pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `1234567` -> `"1,234,567"`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn block_prompt(block: &Block) -> String {
    format!(
        "Provide a concise summary and potential significance of Ethereum block #{id}.
    Key details:
    - Timestamp: {timestamp}
    - Miner: {miner}
    - Transactions: {tx_count}
    - Gas Used: {gas_used}
    - Gas Limit: {gas_limit}
    - Size: {size} bytes
    Explain in simple terms what this block represents and if there are any notable characteristics based on these generic stats. Assume this is a standard Proof-of-Stake block on a major EVM compatible chain. Use Google Search for context if relevant about block significance during its timestamp.",
        id = block.id,
        timestamp = format_timestamp(block.timestamp),
        miner = block.miner,
        tx_count = block.transaction_count(),
        gas_used = group_thousands(block.gas_used),
        gas_limit = group_thousands(block.gas_limit),
        size = group_thousands(block.size),
    )
}

pub fn transaction_prompt(tx: &Transaction) -> String {
    format!(
        "Provide a concise explanation of an Ethereum-like transaction with the following details:
    - Hash: {hash}
    - From: {from}
    - To: {to}
    - Value: {value}
    - Gas Used: {gas_used}
    - Gas Price: {gas_price}
    - Timestamp: {timestamp}
    - Status: {status}
    What could this transaction represent (e.g., token transfer, contract interaction, simple ETH transfer)? Explain its potential significance in simple terms. Use Google Search for context if needed, for example, if the 'To' address is a known contract.",
        hash = tx.hash,
        from = tx.from,
        to = tx.to,
        value = tx.value,
        gas_used = group_thousands(tx.gas_used),
        gas_price = tx.gas_price,
        timestamp = format_timestamp(tx.timestamp),
        status = tx.status,
    )
}

pub fn address_prompt(details: &AddressDetails) -> String {
    format!(
        "Provide a brief overview of an Ethereum-like address: {address}.
    Key details:
    - Balance: {balance}
    - Transaction Count: {count}
    What type of address could this be (e.g., EOA, contract)? What does its activity (balance, transaction count) suggest? Use Google Search for context, e.g., to check if it's a known contract address or associated with a known entity.",
        address = details.address,
        balance = details.balance,
        count = details.transaction_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Ether, Gwei, TxStatus};

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(15_000_000), "15,000,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_block_prompt_carries_details() {
        let block = Block {
            id: 42,
            timestamp: 1_700_000_000,
            miner: "0xminer".to_string(),
            hash: "0xhash".to_string(),
            parent_hash: "0xparent".to_string(),
            transaction_hashes: vec!["0x1".to_string(), "0x2".to_string()],
            gas_used: 7_654_321,
            gas_limit: 15_000_000,
            size: 23_456,
        };
        let prompt = block_prompt(&block);
        assert!(prompt.contains("block #42"));
        assert!(prompt.contains("- Miner: 0xminer"));
        assert!(prompt.contains("- Transactions: 2"));
        assert!(prompt.contains("- Gas Used: 7,654,321"));
        assert!(prompt.contains("- Size: 23,456 bytes"));
        assert!(prompt.contains("2023-11-14 22:13:20 UTC"));
    }

    #[test]
    fn test_transaction_and_address_prompts() {
        let tx = Transaction {
            hash: "0xabc".to_string(),
            block_id: Some(3),
            from: "0xfrom".to_string(),
            to: "0xto".to_string(),
            value: Ether::from_hundredths(123),
            gas_price: Gwei(20),
            gas_used: 21_000,
            timestamp: 0,
            status: TxStatus::Failed,
        };
        let prompt = transaction_prompt(&tx);
        assert!(prompt.contains("- Value: 1.23 ETH"));
        assert!(prompt.contains("- Gas Price: 20 Gwei"));
        assert!(prompt.contains("- Gas Used: 21,000"));
        assert!(prompt.contains("- Status: Failed"));

        let details = AddressDetails {
            address: "0xfrom".to_string(),
            balance: "-1.2300 ETH".to_string(),
            transaction_count: 1,
            transactions: vec![tx],
        };
        let prompt = address_prompt(&details);
        assert!(prompt.contains("address: 0xfrom."));
        assert!(prompt.contains("- Balance: -1.2300 ETH"));
        assert!(prompt.contains("- Transaction Count: 1"));
    }

    #[tokio::test]
    async fn test_disabled_provider_explains_itself() {
        let summary = DisabledSummaryProvider
            .generate_summary("anything", true)
            .await;
        assert_eq!(summary.text, UNAVAILABLE_MESSAGE);
        assert!(summary.sources.is_none());
    }

    #[test]
    fn test_request_body_includes_search_tool_only_when_grounded() {
        let grounded = serde_json::to_value(GenerateContentRequest::new("hi", true)).unwrap();
        assert_eq!(grounded["contents"][0]["parts"][0]["text"], "hi");
        assert!(grounded["tools"][0]["google_search"].is_object());

        let plain = serde_json::to_value(GenerateContentRequest::new("hi", false)).unwrap();
        assert!(plain.get("tools").is_none());
    }

    #[test]
    fn test_response_parsing_collects_text_and_sources() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Block 42 " }, { "text": "is ordinary." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.org/a", "title": "A" } },
                        { "web": { "title": "no uri" } },
                        {}
                    ]
                }
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let summary = response.into_summary().unwrap();
        assert_eq!(summary.text, "Block 42 is ordinary.");
        assert_eq!(
            summary.sources,
            Some(vec![GroundingSource {
                uri: "https://example.org/a".to_string(),
                title: "A".to_string(),
            }])
        );
    }

    #[test]
    fn test_response_without_candidates_is_an_error() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(response.into_summary(), Err(ExplorerError::Summary(_))));
    }

    #[tokio::test]
    async fn test_backend_errors_do_not_expose_api_key() {
        let config = SummaryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..SummaryConfig::default()
        };
        let key = "SECRET-KEY-123";
        let client = GeminiClient::new(key.to_string(), &config).unwrap();
        assert!(!client.endpoint().contains(key));

        let summary = client.generate_summary("prompt", false).await;
        assert!(summary.text.starts_with("Error generating content:"));
        assert!(!summary.text.contains(key), "{}", summary.text);
        assert!(!summary.text.contains("127.0.0.1:9"), "{}", summary.text);
        assert!(summary.sources.is_none());
    }
}
