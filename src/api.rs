//! REST endpoints in front of a single shared ledger.
//!
//! Every mutating request goes through one write lock, so sealing is
//! serialized exactly as if the ledger had a single caller. Mining runs on the
//! blocking pool to keep the async workers free for reads.

use axum::{
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{HashBlock, Ledger};
use crate::error::ChainError;
use crate::transaction::Transaction;

/// Shared handler state: the one ledger instance this process serves.
#[derive(Clone)]
pub struct Node {
    pub ledger: Arc<RwLock<Ledger>>,
}

impl Node {
    pub fn new(ledger: Ledger) -> Self {
        Self::new_shared(Arc::new(RwLock::new(ledger)))
    }

    pub fn new_shared(ledger: Arc<RwLock<Ledger>>) -> Self {
        Self { ledger }
    }

    /// Stage and seal `transaction`, holding the write lock for the whole
    /// mining run.
    pub async fn submit_transaction(&self, transaction: Transaction) -> Result<HashBlock, ApiError> {
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || ledger.blocking_write().submit_transaction(transaction))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "mining task failed");
                ApiError::InternalError("Error processing transaction".to_string())
            })
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    LedgerError(ChainError),
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::LedgerError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::LedgerError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub latest_block: HashBlock,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub violations: Vec<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration for every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

pub fn build_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/add-transaction", post(add_transaction))
        .route("/chain", get(get_chain))
        .route("/validate", get(validate_chain))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_server(node: Arc<Node>, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Ledger server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn add_transaction(
    State(node): State<Arc<Node>>,
    payload: Option<Json<Value>>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let transaction = match payload {
        Some(Json(value)) => Transaction::new(value),
        None => {
            return Err(ApiError::InvalidInput(
                "Transaction data is required".to_string(),
            ))
        }
    };
    if transaction.is_empty() {
        return Err(ApiError::InvalidInput(
            "Transaction data is required".to_string(),
        ));
    }

    let block = node.submit_transaction(transaction).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Transaction added and mined into a new block".to_string(),
            latest_block: block,
        }),
    ))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Json<Ledger> {
    let ledger = node.ledger.read().await;
    Json(ledger.clone())
}

async fn validate_chain(State(node): State<Arc<Node>>) -> Json<ValidateResponse> {
    let report = node.ledger.read().await.validation_report();
    Json(ValidateResponse {
        is_valid: report.is_valid(),
        violations: report.violations.iter().map(|v| v.to_string()).collect(),
    })
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let height = node.ledger.read().await.len();
    Json(serde_json::json!({
        "status": "healthy",
        "height": height,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
