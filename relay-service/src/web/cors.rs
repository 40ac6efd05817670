//! Permissive CORS headers and the JSON response builder that attaches them.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Attach the CORS headers to `response`.
pub fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

/// A JSON response carrying the CORS headers.
pub fn json_response(status: StatusCode, body: Value) -> Response {
    // Json sets `Content-Type: application/json`.
    with_cors((status, Json(body)).into_response())
}

/// Empty 200 answer to a CORS preflight.
pub fn preflight_response() -> Response {
    with_cors(Response::new(Body::empty()))
}
