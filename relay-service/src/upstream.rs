//! Outbound client for the Avito messaging API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::credentials::Credentials;

/// JSON body posted to `{api_url}/messages/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub message: String,
    /// ISO-8601 UTC timestamp captured right before sending
    pub timestamp: String,
}

/// Raw upstream reply. The body is kept as text so error bodies can be
/// passed back verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a chat message to the messaging API.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `message` using `credentials`.
    ///
    /// Only transport failures are errors; any HTTP status is returned as an
    /// [`UpstreamResponse`].
    async fn send(
        &self,
        credentials: &Credentials,
        message: &OutboundMessage,
    ) -> Result<UpstreamResponse>;
}

/// reqwest-backed [`MessageSender`] for the Avito API.
#[derive(Clone)]
pub struct AvitoClient {
    client: Client,
}

impl AvitoClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Avito HTTP client")?;

        Ok(Self { client })
    }
}

fn send_url(api_url: &str) -> String {
    format!("{}/messages/send", api_url.trim_end_matches('/'))
}

#[async_trait]
impl MessageSender for AvitoClient {
    async fn send(
        &self,
        credentials: &Credentials,
        message: &OutboundMessage,
    ) -> Result<UpstreamResponse> {
        let url = send_url(&credentials.api_url);

        info!(url = %url, chat_id = %message.chat_id, "upstream_send_starting");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .json(message)
            .send()
            .await
            .with_context(|| format!("Failed to reach Avito at {}", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read Avito response body")?;

        info!(
            url = %url,
            status_code = status,
            body_length = body.len(),
            "upstream_send_complete"
        );

        Ok(UpstreamResponse { status, body })
    }
}
