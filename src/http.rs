use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::error::StartError;
use crate::event::{parse_event, WebhookEvent};
use crate::manager::SessionManager;
use crate::signing::verify_signature;
use crate::types::ArtifactId;

/// Header the processor puts its HMAC signature in.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Processor-Signature";

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub webhook_secret: Arc<Vec<u8>>,
    pub signature_header: Arc<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/:id", get(check_status))
        .route("/orders", get(list_orders))
        .route("/webhook", post(webhook))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreatePaymentRequest {
    amount: u64,
}

async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Response {
    match state.manager.start_session(request.amount).await {
        Ok(started) => Json(json!({
            "id": started.session.artifact_id.0,
            "presentation_target": started.presentation_target,
            "status": started.session.status,
        }))
        .into_response(),
        Err(err) => {
            let status = match err {
                StartError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
                StartError::ArtifactCreation(_) => StatusCode::BAD_GATEWAY,
                StartError::PartialFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

async fn check_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.manager.status(&ArtifactId(id)).await {
        Ok(Some((status, settlement_id))) => {
            let mut body = json!({ "status": status });
            if let Some(settlement_id) = settlement_id {
                body["settlement_id"] = json!(settlement_id.0);
            }
            Json(body).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "NOT_FOUND" })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

async fn list_orders(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    match state.manager.history(query.limit).await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Reconciliation endpoint: RECEIVE -> VERIFY -> (reject | PARSE ->
/// DISPATCH -> ACK).
///
/// Verification runs over the exact bytes received, before any parsing.
/// Once the signature is valid, every path acks 2xx promptly: the
/// processor retries on non-2xx, and retry storms over conditions we
/// resolve locally (orphans, store hiccups) help nobody. Only an
/// invalid or missing signature returns non-2xx.
async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let provided = headers
        .get(state.signature_header.as_str())
        .and_then(|value| value.to_str().ok());

    let Some(signature) = provided else {
        warn!("webhook rejected: missing signature header");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "invalid_signature" })),
        )
            .into_response();
    };

    if !verify_signature(&state.webhook_secret, &body, signature) {
        warn!("webhook rejected: signature mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "invalid_signature" })),
        )
            .into_response();
    }

    match parse_event(&body) {
        WebhookEvent::Credited {
            artifact_id,
            settlement_id,
        } => {
            // Store failures here are resolved locally; the signature
            // was valid, so still ack to avoid a retry storm.
            if let Err(err) = state
                .manager
                .apply_success(&artifact_id, &settlement_id)
                .await
            {
                error!(
                    artifact_id = %artifact_id.0,
                    error = %err,
                    "settlement write failed; acking anyway"
                );
            }
        }
        WebhookEvent::Ignored { event } => {
            debug!(event, "webhook event acknowledged without state change");
        }
    }

    Json(json!({ "status": "ok" })).into_response()
}
