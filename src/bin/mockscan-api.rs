#![forbid(unsafe_code)]
//! HTTP API for the mock explorer

use mockscan::api::{run_api_server, ExplorerNode};
use mockscan::config::load_config;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.api.port);

    let node = Arc::new(ExplorerNode::from_config(&config));

    // generate up front so the first request doesn't pay for it
    let ledger = node.query.store().ensure_initialized();
    tracing::info!(
        blocks = ledger.blocks.len(),
        transactions = ledger.transactions.len(),
        port,
        "starting mockscan-api"
    );

    run_api_server(node, port).await
}
