//! The relay endpoint — `POST /api/chat`.
//!
//! Accepts the full message history, relays it upstream, and always answers
//! with either the new assistant message or a structured `{ "error": ... }`
//! body. No failure ever escapes the handler unshaped.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_core::types::Message;

use crate::relay::{Relay, RelayError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<dyn Relay>,
}

/// Request body: the whole conversation so far, last entry = new user turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Structured failure body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build the relay router.
pub fn router(relay: Arc<dyn Relay>) -> Router {
    Router::new()
        .route("/api/chat", post(api_chat))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// POST /api/chat — relay a message history.
async fn api_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Message>, (StatusCode, Json<ErrorBody>)> {
    match state.relay.relay(&request.messages).await {
        Ok(message) => Ok(Json(message)),
        Err(e) => {
            let status = match e {
                RelayError::EmptyHistory => StatusCode::BAD_REQUEST,
                RelayError::ContentBlocked { .. } | RelayError::Upstream(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            Err((
                status,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Bind and run the relay endpoint until shutdown.
pub async fn serve(bind: &str, relay: Arc<dyn Relay>) -> anyhow::Result<()> {
    let app = router(relay);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, "relay endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
