//! Dispatch error type.
//!
//! The dispatch handler returns `Result<T, DispatchError>`, which implements
//! [`axum::response::IntoResponse`] so every failure becomes a JSON body with
//! the CORS headers attached.
//!
//! Store errors and internal faults are logged with full detail but only a
//! generic message reaches the caller. Upstream rejections are the exception:
//! the Avito response body is passed through as `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::web::cors::json_response;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const CREDENTIAL_LOOKUP_FAILED: &str = "Failed to get user credentials";
pub const NO_CREDENTIALS: &str = "No API credentials found";
pub const UPSTREAM_REJECTED: &str = "Failed to send message to Avito";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// All errors that can end a dispatch request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `chatId` or `message` was absent or empty.
    #[error("missing required fields")]
    MissingFields,

    /// The user credential lookup failed for a reason other than "no row".
    #[error("user credential lookup failed: {0}")]
    CredentialLookup(#[source] StoreError),

    /// Neither resolution tier produced credentials.
    #[error("no API credentials found")]
    NoCredentials,

    /// Avito answered with a non-success status.
    #[error("Avito rejected the message with status {status}")]
    UpstreamRejected { status: u16, details: String },

    /// Anything else.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::MissingFields => {
                json_response(StatusCode::BAD_REQUEST, json!({ "error": MISSING_FIELDS }))
            }
            DispatchError::CredentialLookup(e) => {
                error!(error = %e, "dispatch_credential_lookup_error");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": CREDENTIAL_LOOKUP_FAILED }),
                )
            }
            DispatchError::NoCredentials => {
                json_response(StatusCode::BAD_REQUEST, json!({ "error": NO_CREDENTIALS }))
            }
            DispatchError::UpstreamRejected { status, details } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                json_response(status, json!({ "error": UPSTREAM_REJECTED, "details": details }))
            }
            DispatchError::Internal(e) => {
                // Log the full chain before discarding it.
                error!(error = ?e, "dispatch_internal_error");
                internal_error_response()
            }
        }
    }
}

/// The generic 500 response used for unhandled faults and panics.
pub fn internal_error_response() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": INTERNAL_ERROR }),
    )
}
