//! Row types for the tables the relay reads from and writes to.

use serde::{Deserialize, Serialize};

/// Per-user Avito API credentials.
pub const CREDENTIALS_TABLE: &str = "user_api_credentials";

/// Avito integrations, each owned by one credential record.
pub const INTEGRATIONS_TABLE: &str = "avito_integrations";

/// Audit trail of sent and received Avito messages.
pub const MESSAGES_TABLE: &str = "avito_messages";

// =============================================================================
// Read Models
// =============================================================================

/// A row from `user_api_credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserCredentialRecord {
    /// Bearer token for the Avito API
    pub api_key: String,
    /// Avito API base URL; empty or null means "use the default"
    #[serde(default)]
    pub api_url: Option<String>,
}

/// A row from `avito_integrations` with its credential embedded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IntegrationRecord {
    #[serde(default, rename = "user_api_credentials")]
    pub credential: Option<UserCredentialRecord>,
}

// =============================================================================
// Write Models
// =============================================================================

/// A row written to `avito_messages` for every message sent on behalf of an
/// integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessageRecord {
    pub integration_id: String,
    pub chat_id: String,
    pub message_text: String,
    pub is_incoming: bool,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
}

impl OutgoingMessageRecord {
    pub fn new(integration_id: String, chat_id: String, message_text: String, timestamp: String) -> Self {
        Self {
            integration_id,
            chat_id,
            message_text,
            is_incoming: false,
            timestamp,
        }
    }
}
