//! Integration tests for the mockscan API endpoints
//!
//! A seeded ledger with no simulated latency is served through the full
//! router, so responses can be compared against the ledger directly.

#![cfg(feature = "api")]

use axum_test::TestServer;
use mockscan::api::{build_api_router, ApiStatsResponse, ExplorerNode};
use mockscan::blockchain::{Ledger, LedgerStatus, LedgerStore};
use mockscan::generator::LedgerGenerator;
use mockscan::query::QueryService;
use mockscan::summary::{DisabledSummaryProvider, UNAVAILABLE_MESSAGE};
use serde_json::Value;
use std::sync::Arc;

fn seeded_ledger() -> Ledger {
    LedgerGenerator::new(20, 10)
        .with_seed(2024)
        .with_clock(1_700_000_000)
        .generate()
}

fn test_server(ledger: Ledger) -> Result<TestServer, Box<dyn std::error::Error>> {
    let store = Arc::new(LedgerStore::from_ledger(ledger));
    let node = ExplorerNode::new(QueryService::new(store), Arc::new(DisabledSummaryProvider), 5);
    let server = TestServer::new(build_api_router(Arc::new(node)))?;
    Ok(server)
}

#[tokio::test]
async fn test_system_endpoints() -> Result<(), Box<dyn std::error::Error>> {
    let server = test_server(seeded_ledger())?;

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["ledger_status"], "ready");
    assert!(json["timestamp"].is_string());

    server.get("/api/block/0").await;
    server.get("/api/block/999").await;

    let response = server.get("/api/stats").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    // the stats request itself is counted after its response is built
    assert_eq!(json["total_requests"], 3);
    assert_eq!(json["successful_requests"], 2);
    assert_eq!(json["failed_requests"], 1);
    assert!(json["uptime_seconds"].is_number());

    Ok(())
}

#[tokio::test]
async fn test_latest_endpoints() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = seeded_ledger();
    let server = test_server(ledger.clone())?;

    let response = server.get("/api/blocks/latest").await;
    assert_eq!(response.status_code(), 200);
    let blocks: Vec<Value> = response.json();
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0]["id"], ledger.latest_blocks(1)[0].id);

    let response = server
        .get("/api/blocks/latest")
        .add_query_param("count", 1000)
        .await;
    assert_eq!(response.status_code(), 200);
    let blocks: Vec<Value> = response.json();
    assert_eq!(blocks.len(), 10);
    let ids: Vec<u64> = blocks.iter().filter_map(|b| b["id"].as_u64()).collect();
    assert_eq!(ids, (0..10).rev().collect::<Vec<u64>>());

    let response = server
        .get("/api/transactions/latest")
        .add_query_param("count", 3)
        .await;
    assert_eq!(response.status_code(), 200);
    let txs: Vec<Value> = response.json();
    assert_eq!(txs.len(), 3);
    let timestamps: Vec<u64> = txs.iter().filter_map(|tx| tx["timestamp"].as_u64()).collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));

    Ok(())
}

#[tokio::test]
async fn test_lookup_endpoints() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = seeded_ledger();
    let server = test_server(ledger.clone())?;

    let block = &ledger.blocks[3];
    let response = server.get(&format!("/api/block/{}", block.id)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["hash"], block.hash.as_str());
    assert_eq!(json["parent_hash"], block.parent_hash.as_str());

    let response = server.get(&format!("/api/block/hash/{}", block.hash)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["id"], block.id);

    let tx = &ledger.transactions[0];
    let response = server.get(&format!("/api/transaction/{}", tx.hash)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["from"], tx.from.as_str());
    assert_eq!(json["value"], tx.value.to_string());

    let response = server.get(&format!("/api/address/{}", tx.from.to_uppercase().replacen("0X", "0x", 1))).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert!(json["balance"].as_str().is_some_and(|b| b.ends_with(" ETH")));
    assert!(json["transaction_count"].as_u64().is_some_and(|n| n >= 1));

    Ok(())
}

#[tokio::test]
async fn test_missing_items_return_404() -> Result<(), Box<dyn std::error::Error>> {
    let server = test_server(seeded_ledger())?;
    let unknown_hash = format!("0x{}", "0".repeat(64));
    let unknown_address = format!("0x{}", "0".repeat(40));

    for path in [
        "/api/block/999999".to_string(),
        format!("/api/block/hash/{}", unknown_hash),
        format!("/api/transaction/{}", unknown_hash),
        format!("/api/address/{}", unknown_address),
        format!("/api/transaction/{}/summary", unknown_hash),
    ] {
        let response = server.get(&path).await;
        assert_eq!(response.status_code(), 404, "{}", path);
        let json: Value = response.json();
        assert!(json["error"].is_string());
    }

    let response = server.get("/api/block/latest").await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_malformed_query_returns_json_error() -> Result<(), Box<dyn std::error::Error>> {
    let server = test_server(seeded_ledger())?;

    for path in ["/api/blocks/latest", "/api/transactions/latest"] {
        let response = server.get(path).add_query_param("count", "abc").await;
        assert_eq!(response.status_code(), 400, "{}", path);
        let json: Value = response.json();
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()), "{}", path);
    }

    let response = server.get("/api/blocks/latest").add_query_param("count", -1).await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_search_endpoint() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = seeded_ledger();
    let server = test_server(ledger.clone())?;

    let response = server.get("/api/search").add_query_param("q", " 2 ").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["query"], "2");
    assert_eq!(json["kind"], "block");
    assert_eq!(json["data"]["id"], 2);

    let tx = &ledger.transactions[5];
    let response = server.get("/api/search").add_query_param("q", &tx.hash).await;
    let json: Value = response.json();
    assert_eq!(json["kind"], "transaction");
    assert_eq!(json["data"]["hash"], tx.hash.as_str());

    let response = server.get("/api/search").add_query_param("q", "hello").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["kind"], "not_found");
    assert!(json.get("data").is_none());

    Ok(())
}

#[tokio::test]
async fn test_summary_without_provider() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = seeded_ledger();
    let server = test_server(ledger.clone())?;

    let response = server.get("/api/block/1/summary").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["text"], UNAVAILABLE_MESSAGE);
    assert!(json["sources"].is_null());

    let response = server
        .get(&format!("/api/address/{}/summary", ledger.blocks[0].miner))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server.get("/api/stats").await;
    let stats: ApiStatsResponse = response.json();
    assert_eq!(stats.summaries_requested, 2);
    assert_eq!(stats.ledger_status, LedgerStatus::Ready);

    Ok(())
}
