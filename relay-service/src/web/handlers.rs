//! HTTP endpoint handlers.
//!
//! The send endpoint accepts any method so that it alone decides how to
//! answer: OPTIONS is a preflight, everything else is a send attempt.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::request::SendRequest;
use crate::web::cors::{json_response, preflight_response};
use crate::Config;

pub const SEND_SUCCESS_MESSAGE: &str = "Message sent successfully";

/// Shared application state. Handlers read `config` for per-request limits.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Send Message
// =============================================================================

/// Send endpoint.
///
/// This endpoint:
/// 1. Answers CORS preflights without touching the body
/// 2. Parses the body and runs the dispatch pipeline
/// 3. Wraps the Avito reply, or the error, in a JSON response
pub async fn send_avito_message(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Response {
    if method == Method::OPTIONS {
        return preflight_response();
    }

    match handle_send(&state, body).await {
        Ok(avito_response) => json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "message": SEND_SUCCESS_MESSAGE,
                "avito_response": avito_response,
            }),
        ),
        Err(e) => e.into_response(),
    }
}

/// Buffer the body ourselves so read failures, oversized bodies included,
/// still end in a JSON response.
async fn handle_send(state: &AppState, body: Body) -> Result<Value, DispatchError> {
    let limit = state.config.max_body_bytes;
    let body = to_bytes(body, limit)
        .await
        .with_context(|| format!("Failed to read request body (limit {} bytes)", limit))?;

    let request: SendRequest =
        serde_json::from_slice(&body).context("Request body is not a valid send request")?;

    info!(
        has_chat_id = request.chat_id().is_some(),
        has_message = request.message().is_some(),
        user_id = ?request.user_id(),
        integration_id = ?request.integration_id(),
        "send_request_received"
    );

    state.dispatcher.dispatch(request).await
}
