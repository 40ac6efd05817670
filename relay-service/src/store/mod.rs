//! Data store access for credentials and the outgoing message audit trail.
//!
//! This module provides:
//! - Record types for the three tables the relay touches
//! - `CredentialStore` / `MessageStore` traits used by the dispatcher
//! - A PostgREST-backed implementation of both
//!
//! Reads return a three-way [`Lookup`] so callers decide for themselves
//! whether a failed read is fatal or just "nothing found".

pub mod postgrest;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use postgrest::PostgrestStore;
pub use types::{
    IntegrationRecord, OutgoingMessageRecord, UserCredentialRecord, CREDENTIALS_TABLE,
    INTEGRATIONS_TABLE, MESSAGES_TABLE,
};

/// Errors raised while talking to the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outcome of a single-row read.
#[derive(Debug)]
pub enum Lookup<T> {
    /// Exactly one row matched.
    Found(T),
    /// No row matched.
    NotFound,
    /// The read itself failed.
    Failed(StoreError),
}

impl<T> From<Result<Option<T>, StoreError>> for Lookup<T> {
    fn from(result: Result<Option<T>, StoreError>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::Failed(e),
        }
    }
}

/// Read access to API credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the single active credential record owned by `user_id`.
    async fn find_active_credential_by_user(&self, user_id: &str) -> Lookup<UserCredentialRecord>;

    /// Fetch an integration together with its (inner-joined) credential record.
    async fn find_integration_with_credential(
        &self,
        integration_id: &str,
    ) -> Lookup<IntegrationRecord>;
}

/// Write access to the outgoing message audit trail.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_outgoing_message(
        &self,
        record: &OutgoingMessageRecord,
    ) -> Result<(), StoreError>;
}
