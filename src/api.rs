//! REST API for the mock explorer
//!
//! Read-only JSON endpoints over the query service, plus optional AI
//! summaries for blocks, transactions and addresses.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, LedgerStatus};
use crate::config::Config;
use crate::query::{AddressDetails, QueryService, SearchResult};
use crate::summary::{self, Summary, SummaryProvider};
use crate::transaction::Transaction;

/// Upper bound for `count` on the latest-items endpoints.
pub const MAX_LATEST_COUNT: usize = 100;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct ExplorerNode {
    pub query: QueryService,
    pub summaries: Arc<dyn SummaryProvider>,
    latest_default: usize,
    api_stats: Arc<RwLock<ApiStats>>,
}

#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    summaries_requested: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub summaries_requested: u64,
    pub uptime_seconds: u64,
    pub ledger_status: LedgerStatus,
}

impl ExplorerNode {
    pub fn new(query: QueryService, summaries: Arc<dyn SummaryProvider>, latest_default: usize) -> Self {
        Self {
            query,
            summaries,
            latest_default: latest_default.clamp(1, MAX_LATEST_COUNT),
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            crate::cli::build_query_service(config),
            crate::cli::build_summary_provider(config),
            config.explorer.latest_items_count,
        )
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            summaries_requested: stats.summaries_requested,
            uptime_seconds: uptime,
            ledger_status: self.query.ledger_status(),
        }
    }

    async fn summarize(&self, prompt: String) -> Summary {
        self.api_stats.write().await.summaries_requested += 1;
        self.summaries.generate_summary(&prompt, true).await
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn parse_block_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::InvalidInput(format!("Invalid block number: {}", raw)))
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(
    State(node): State<Arc<ExplorerNode>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Logs method, path, status, duration and ledger state per request.
async fn logging_middleware(
    State(node): State<Arc<ExplorerNode>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        ledger_state = ?node.query.ledger_status(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Builds the `/api` router; also used directly by tests.
pub fn build_api_router(node: Arc<ExplorerNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Blocks
        .route("/blocks/latest", get(get_latest_blocks))
        .route("/block/:id", get(get_block))
        .route("/block/hash/:hash", get(get_block_by_hash))
        .route("/block/:id/summary", get(get_block_summary))
        // Transactions
        .route("/transactions/latest", get(get_latest_transactions))
        .route("/transaction/:hash", get(get_transaction))
        .route("/transaction/:hash/summary", get(get_transaction_summary))
        // Addresses
        .route("/address/:address", get(get_address))
        .route("/address/:address/summary", get(get_address_summary))
        // Search
        .route("/search", get(search))
        // System
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(
    node: Arc<ExplorerNode>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "api.listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<ExplorerNode>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "ledger_status": node.query.ledger_status(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_api_stats(State(node): State<Arc<ExplorerNode>>) -> Json<ApiStatsResponse> {
    Json(node.get_stats().await)
}

fn latest_count(node: &ExplorerNode, params: &LatestQuery) -> usize {
    params
        .count
        .unwrap_or(node.latest_default)
        .min(MAX_LATEST_COUNT)
}

async fn get_latest_blocks(
    State(node): State<Arc<ExplorerNode>>,
    params: Result<Query<LatestQuery>, QueryRejection>,
) -> Result<Json<Vec<Block>>, ApiError> {
    let Query(params) = params?;
    let count = latest_count(&node, &params);
    Ok(Json(node.query.latest_blocks(count).await))
}

async fn get_latest_transactions(
    State(node): State<Arc<ExplorerNode>>,
    params: Result<Query<LatestQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let Query(params) = params?;
    let count = latest_count(&node, &params);
    Ok(Json(node.query.latest_transactions(count).await))
}

async fn find_block(node: &ExplorerNode, raw_id: &str) -> Result<Block, ApiError> {
    let id = parse_block_id(raw_id)?;
    node.query
        .block_by_id(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Block #{} not found", id)))
}

async fn find_transaction(node: &ExplorerNode, hash: &str) -> Result<Transaction, ApiError> {
    node.query
        .transaction_by_hash(hash)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Transaction {} not found", hash)))
}

async fn find_address(node: &ExplorerNode, address: &str) -> Result<AddressDetails, ApiError> {
    node.query
        .address_details(address)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Address {} not found", address)))
}

async fn get_block(
    State(node): State<Arc<ExplorerNode>>,
    Path(id): Path<String>,
) -> Result<Json<Block>, ApiError> {
    find_block(&node, &id).await.map(Json)
}

async fn get_block_by_hash(
    State(node): State<Arc<ExplorerNode>>,
    Path(hash): Path<String>,
) -> Result<Json<Block>, ApiError> {
    node.query
        .block_by_hash(&hash)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block {} not found", hash)))
}

async fn get_transaction(
    State(node): State<Arc<ExplorerNode>>,
    Path(hash): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    find_transaction(&node, &hash).await.map(Json)
}

async fn get_address(
    State(node): State<Arc<ExplorerNode>>,
    Path(address): Path<String>,
) -> Result<Json<AddressDetails>, ApiError> {
    find_address(&node, &address).await.map(Json)
}

async fn search(
    State(node): State<Arc<ExplorerNode>>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Query(params) = params?;
    Ok(Json(node.query.search(&params.q).await))
}

async fn get_block_summary(
    State(node): State<Arc<ExplorerNode>>,
    Path(id): Path<String>,
) -> Result<Json<Summary>, ApiError> {
    let block = find_block(&node, &id).await?;
    Ok(Json(node.summarize(summary::block_prompt(&block)).await))
}

async fn get_transaction_summary(
    State(node): State<Arc<ExplorerNode>>,
    Path(hash): Path<String>,
) -> Result<Json<Summary>, ApiError> {
    let tx = find_transaction(&node, &hash).await?;
    Ok(Json(node.summarize(summary::transaction_prompt(&tx)).await))
}

async fn get_address_summary(
    State(node): State<Arc<ExplorerNode>>,
    Path(address): Path<String>,
) -> Result<Json<Summary>, ApiError> {
    let details = find_address(&node, &address).await?;
    Ok(Json(node.summarize(summary::address_prompt(&details)).await))
}
