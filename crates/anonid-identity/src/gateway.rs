//! REST gateway exposing any [`LedgerClient`] over HTTP.
//!
//! This is the server side of [`HttpLedgerClient`](crate::HttpLedgerClient).
//! Backed by an [`InMemoryLedger`](crate::InMemoryLedger) it serves as a
//! local development ledger.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::LedgerError;
use crate::ledger::{LedgerClient, TxHandle};

type SharedLedger = Arc<dyn LedgerClient>;
type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub owner: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveResponse {
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub created_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TxResponse {
    pub tx_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub success: bool,
    pub block_number: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequest {
    pub did: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetAttributeRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(e: LedgerError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        LedgerError::Rejected(_) => StatusCode::CONFLICT,
        LedgerError::Decode(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Transport(_) | LedgerError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

async fn handle_owner(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
) -> ApiResult<OwnerResponse> {
    let owner = ledger.get_owner(&did).await.map_err(error_response)?;
    Ok(Json(OwnerResponse { owner }))
}

async fn handle_active(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
) -> ApiResult<ActiveResponse> {
    let active = ledger.is_active(&did).await.map_err(error_response)?;
    Ok(Json(ActiveResponse { active }))
}

async fn handle_keys(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
) -> ApiResult<KeysResponse> {
    let keys = ledger.get_attribute_keys(&did).await.map_err(error_response)?;
    Ok(Json(KeysResponse { keys }))
}

async fn handle_attribute(
    State(ledger): State<SharedLedger>,
    Path((did, key)): Path<(String, String)>,
) -> ApiResult<ValueResponse> {
    let value = ledger.get_attribute(&did, &key).await.map_err(error_response)?;
    Ok(Json(ValueResponse { value }))
}

async fn handle_created(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
) -> ApiResult<CreatedResponse> {
    let created_at = ledger.get_creation_time(&did).await.map_err(error_response)?;
    Ok(Json(CreatedResponse { created_at }))
}

async fn handle_create(
    State(ledger): State<SharedLedger>,
    Json(req): Json<CreateRequest>,
) -> ApiResult<TxResponse> {
    let tx = ledger.create_record(&req.did).await.map_err(error_response)?;
    tracing::info!(did = %req.did, tx = %tx, "registration submitted");
    Ok(Json(TxResponse { tx_hash: tx.0 }))
}

async fn handle_set_attribute(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
    Json(req): Json<SetAttributeRequest>,
) -> ApiResult<TxResponse> {
    let tx = ledger
        .set_attribute(&did, &req.key, &req.value)
        .await
        .map_err(error_response)?;
    tracing::info!(did = %did, key = %req.key, tx = %tx, "attribute submitted");
    Ok(Json(TxResponse { tx_hash: tx.0 }))
}

async fn handle_deactivate(
    State(ledger): State<SharedLedger>,
    Path(did): Path<String>,
) -> ApiResult<TxResponse> {
    let tx = ledger.deactivate_record(&did).await.map_err(error_response)?;
    tracing::info!(did = %did, tx = %tx, "deactivation submitted");
    Ok(Json(TxResponse { tx_hash: tx.0 }))
}

async fn handle_receipt(
    State(ledger): State<SharedLedger>,
    Path(tx_hash): Path<String>,
) -> ApiResult<ReceiptResponse> {
    let receipt = ledger
        .confirm(&TxHandle(tx_hash))
        .await
        .map_err(error_response)?;
    Ok(Json(ReceiptResponse {
        success: receipt.success,
        block_number: receipt.block_number,
    }))
}

/// Build the gateway router over a ledger.
pub fn build_router(ledger: SharedLedger) -> Router {
    Router::new()
        .route("/api/v1/dids", post(handle_create))
        .route("/api/v1/dids/{did}/owner", get(handle_owner))
        .route("/api/v1/dids/{did}/active", get(handle_active))
        .route(
            "/api/v1/dids/{did}/attributes",
            get(handle_keys).post(handle_set_attribute),
        )
        .route("/api/v1/dids/{did}/attributes/{key}", get(handle_attribute))
        .route("/api/v1/dids/{did}/created", get(handle_created))
        .route("/api/v1/dids/{did}/deactivate", post(handle_deactivate))
        .route("/api/v1/tx/{tx_hash}/receipt", get(handle_receipt))
        .with_state(ledger)
}

/// Serve the gateway until the listener fails.
pub async fn serve(ledger: SharedLedger, listener: tokio::net::TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "ledger gateway listening");
    }
    axum::serve(listener, build_router(ledger)).await
}
