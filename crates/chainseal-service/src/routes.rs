//! HTTP routes for the chainseal service.
//!
//! Thin handlers over the ledger: every response is derived from an
//! append receipt, the committed head, or a recomputed audit window.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use chainseal::{Record, RetentionStatus, VerificationResult};

use crate::error::ApiError;
use crate::AppState;

/// Upper bound on entries verified by a single audit call.
pub const MAX_AUDIT_LIMIT: usize = 10_000;

/// Build the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/hash", post(submit_record))
        .route("/status", get(chain_status))
        .route("/health", get(health))
        .route("/audit", get(audit_window))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Seal proof returned from `POST /hash`.
#[derive(Debug, Serialize)]
pub struct AppendResponse {
    /// Position of the sealed entry on the chain.
    pub sequence: u64,
    /// Idempotency key the entry is stored under.
    pub message_id: String,
    /// SHA-256 of the canonical payload, hex.
    pub payload_hash: String,
    /// Chain hash of the sealed entry, hex.
    pub chain_hash: String,
    /// Chain hash this entry links back to, hex.
    pub prev_hash: String,
    /// UTC day partition of the storage key.
    pub partition: String,
    /// Retention outcome: `archived`, `failed`, or `disabled`.
    pub retention: String,
    /// Archive error detail when retention degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_error: Option<String>,
}

/// Committed head returned from `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Chain hash of the last sealed entry, hex. All zeros when empty.
    pub chain_hash: String,
    /// Sequence the next entry will take.
    pub next_sequence: u64,
    /// Whether a retention archive is configured.
    pub retention_enabled: bool,
}

/// Query window for `GET /audit`.
#[derive(Debug, Deserialize)]
pub struct AuditParams {
    /// First sequence of the window. Defaults to the start of the chain.
    #[serde(default = "default_from")]
    pub from: u64,
    /// Maximum entries to verify, clamped to [`MAX_AUDIT_LIMIT`].
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_from() -> u64 {
    1
}

fn default_limit() -> usize {
    1000
}

/// Verified window returned from `GET /audit`.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    /// Start of the window actually verified.
    pub from: u64,
    /// Entries found in the window.
    pub count: usize,
    /// First stored sequence in the window, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_sequence: Option<u64>,
    /// Last stored sequence in the window, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sequence: Option<u64>,
    /// Recomputation outcome over the window.
    pub verification: VerificationResult,
    /// Stored sequence of the first broken entry, when broken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_at_sequence: Option<u64>,
}

fn retention_label(status: &RetentionStatus) -> (&'static str, Option<String>) {
    match status {
        RetentionStatus::Archived => ("archived", None),
        RetentionStatus::Failed(reason) => ("failed", Some(reason.clone())),
        RetentionStatus::Disabled => ("disabled", None),
    }
}

/// `POST /hash`: validate a record, seal it onto the chain, and return
/// the receipt.
pub async fn submit_record(
    State(state): State<AppState>,
    Json(record): Json<Record>,
) -> Result<Json<AppendResponse>, ApiError> {
    let receipt = state.ledger.append(&record).await?;
    let (retention, retention_error) = retention_label(&receipt.retention);

    Ok(Json(AppendResponse {
        sequence: receipt.entry.sequence,
        payload_hash: receipt.entry.payload_hash.to_hex(),
        chain_hash: receipt.entry.chain_hash.to_hex(),
        prev_hash: receipt.entry.prev_hash.to_hex(),
        message_id: receipt.entry.message_id,
        partition: receipt.storage_key.partition,
        retention: retention.to_string(),
        retention_error,
    }))
}

/// `GET /status`: the committed chain head.
pub async fn chain_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let head = state.ledger.current_head();

    Json(StatusResponse {
        chain_hash: head.hash.to_hex(),
        next_sequence: head.next_sequence,
        retention_enabled: state.ledger.retention_enabled(),
    })
}

/// `GET /health`: liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /audit`: fetch a stored window of the chain and recompute its
/// hashes.
pub async fn audit_window(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
) -> Result<Json<AuditResponse>, ApiError> {
    let from = params.from.max(1);
    let limit = params.limit.min(MAX_AUDIT_LIMIT);
    let report = state.ledger.audit(from, limit).await?;

    let broken_at_sequence = match report.result {
        VerificationResult::Broken { at_index, .. } => {
            report.entries.get(at_index).map(|entry| entry.sequence)
        }
        VerificationResult::Valid => None,
    };

    Ok(Json(AuditResponse {
        from,
        count: report.entries.len(),
        first_sequence: report.entries.first().map(|entry| entry.sequence),
        last_sequence: report.entries.last().map(|entry| entry.sequence),
        verification: report.result,
        broken_at_sequence,
    }))
}
