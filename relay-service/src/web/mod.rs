//! Web server module.
//!
//! This module provides the HTTP surface of the relay:
//! - `/send-avito-message`: preflight and send endpoint
//! - `/health`: liveness probe
//!
//! Every JSON response carries the permissive CORS headers, including the
//! generic 500 produced when a handler panics.

pub mod cors;
pub mod handlers;

use std::any::Any;

use axum::{
    response::Response,
    routing::{any, get},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::error::internal_error_response;

pub use handlers::{health, send_avito_message, AppState, HealthResponse};

/// Route serving the send endpoint.
pub const SEND_ROUTE: &str = "/send-avito-message";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(SEND_ROUTE, any(send_avito_message))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a handler panic into the generic internal error response.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    error!(panic = %detail, "handler_panicked");

    internal_error_response()
}
