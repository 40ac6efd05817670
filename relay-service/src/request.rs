//! Inbound send request payload.

use serde::Deserialize;

/// JSON body accepted by the send endpoint.
///
/// All fields are optional at the wire level so that a missing `chatId` or
/// `message` is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub integration_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SendRequest {
    pub fn chat_id(&self) -> Option<&str> {
        non_empty(&self.chat_id)
    }

    pub fn message(&self) -> Option<&str> {
        non_empty(&self.message)
    }

    pub fn integration_id(&self) -> Option<&str> {
        non_empty(&self.integration_id)
    }

    pub fn user_id(&self) -> Option<&str> {
        non_empty(&self.user_id)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
