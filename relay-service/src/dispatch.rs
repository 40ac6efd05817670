//! Message dispatch pipeline.
//!
//! ```text
//! SendRequest → validate → resolve credentials → send to Avito → audit (detached) → response JSON
//! ```
//!
//! Every stage runs sequentially and the first failure ends the request.
//! Nothing is retried.

use std::sync::Arc;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::credentials::CredentialChain;
use crate::error::DispatchError;
use crate::request::SendRequest;
use crate::store::{CredentialStore, MessageStore, OutgoingMessageRecord};
use crate::upstream::{MessageSender, OutboundMessage};

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolves credentials, relays the message and records the audit row.
pub struct Dispatcher {
    credential_store: Arc<dyn CredentialStore>,
    message_store: Arc<dyn MessageStore>,
    sender: Arc<dyn MessageSender>,
    credentials: CredentialChain,
}

impl Dispatcher {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        message_store: Arc<dyn MessageStore>,
        sender: Arc<dyn MessageSender>,
        credentials: CredentialChain,
    ) -> Self {
        Self {
            credential_store,
            message_store,
            sender,
            credentials,
        }
    }

    /// Run the dispatch pipeline for one request.
    ///
    /// Returns the parsed JSON body Avito answered with.
    pub async fn dispatch(&self, request: SendRequest) -> Result<Value, DispatchError> {
        let (chat_id, message) = match (request.chat_id(), request.message()) {
            (Some(chat_id), Some(message)) => (chat_id, message),
            _ => {
                warn!(
                    has_chat_id = request.chat_id().is_some(),
                    has_message = request.message().is_some(),
                    "dispatch_missing_fields"
                );
                return Err(DispatchError::MissingFields);
            }
        };

        let credentials = self
            .credentials
            .resolve(self.credential_store.as_ref(), &request)
            .await
            .map_err(DispatchError::CredentialLookup)?
            .ok_or_else(|| {
                warn!(
                    has_user_id = request.user_id().is_some(),
                    has_integration_id = request.integration_id().is_some(),
                    "dispatch_no_credentials"
                );
                DispatchError::NoCredentials
            })?;

        let outbound = OutboundMessage {
            chat_id: chat_id.to_string(),
            message: message.to_string(),
            timestamp: now_timestamp(),
        };

        let response = self.sender.send(&credentials, &outbound).await?;

        if !response.is_success() {
            error!(
                status_code = response.status,
                status_text = reqwest::StatusCode::from_u16(response.status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or(""),
                body_length = response.body.len(),
                "upstream_send_rejected"
            );
            return Err(DispatchError::UpstreamRejected {
                status: response.status,
                details: response.body,
            });
        }

        let avito_response: Value = serde_json::from_str(&response.body)
            .context("Avito returned a non-JSON success body")?;

        if let Some(integration_id) = request.integration_id() {
            self.record_outgoing(OutgoingMessageRecord::new(
                integration_id.to_string(),
                outbound.chat_id.clone(),
                outbound.message.clone(),
                now_timestamp(),
            ));
        }

        info!(
            chat_id = %outbound.chat_id,
            integration_id = ?request.integration_id(),
            "dispatch_complete"
        );

        Ok(avito_response)
    }

    /// Write the audit row on a detached task. The outcome is only logged.
    fn record_outgoing(&self, record: OutgoingMessageRecord) {
        let store = Arc::clone(&self.message_store);

        tokio::spawn(async move {
            if let Err(e) = store.insert_outgoing_message(&record).await {
                warn!(
                    integration_id = %record.integration_id,
                    chat_id = %record.chat_id,
                    error = %e,
                    "audit_record_insert_failed"
                );
            }
        });
    }
}
