//! PostgREST (Supabase REST) implementation of the store traits.
//!
//! Every request authenticates with the service role key, sent both as the
//! `apikey` header and as a bearer token. Single-row reads ask PostgREST for a
//! bare object, which makes it answer `406 PGRST116` when the filter matched no
//! row or more than one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::types::{
    IntegrationRecord, OutgoingMessageRecord, UserCredentialRecord, CREDENTIALS_TABLE,
    INTEGRATIONS_TABLE, MESSAGES_TABLE,
};
use super::{CredentialStore, Lookup, MessageStore, StoreError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const NO_ROWS_CODE: &str = "PGRST116";

/// Data store client speaking the PostgREST dialect.
#[derive(Clone)]
pub struct PostgrestStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    client: Client,
    rest_url: String,
    service_key: String,
}

/// Error body PostgREST returns for failed requests.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl PostgrestStore {
    /// Create a store client for the project at `base_url`.
    pub fn new(base_url: &str, service_key: String, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                client,
                rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
                service_key,
            }),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{}", self.inner.rest_url, table))
            .header("apikey", &self.inner.service_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.inner.service_key))
    }

    /// Fetch exactly one row. Zero rows is `Ok(None)`; anything else that is
    /// not a single row is an error.
    async fn fetch_single<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, StoreError> {
        let response = self
            .request(Method::GET, table)
            .header(ACCEPT, SINGLE_OBJECT)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(Some(serde_json::from_str(&body)?));
        }

        if status == StatusCode::NOT_ACCEPTABLE && is_zero_rows(&body) {
            debug!(table = table, "store_row_not_found");
            return Ok(None);
        }

        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Whether a PostgREST error body is the "no row matched" case.
///
/// `PGRST116` is also used when several rows match; only the zero-row variant
/// counts as not found.
fn is_zero_rows(body: &str) -> bool {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(err) => {
            err.code.as_deref() == Some(NO_ROWS_CODE)
                && err.details.as_deref().is_some_and(|d| d.contains(" 0 rows"))
        }
        Err(_) => false,
    }
}

#[async_trait]
impl CredentialStore for PostgrestStore {
    async fn find_active_credential_by_user(&self, user_id: &str) -> Lookup<UserCredentialRecord> {
        self.fetch_single(
            CREDENTIALS_TABLE,
            &[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("is_active", "eq.true".to_string()),
            ],
        )
        .await
        .into()
    }

    async fn find_integration_with_credential(
        &self,
        integration_id: &str,
    ) -> Lookup<IntegrationRecord> {
        self.fetch_single(
            INTEGRATIONS_TABLE,
            &[
                ("select", format!("*,{}!inner(*)", CREDENTIALS_TABLE)),
                ("id", format!("eq.{}", integration_id)),
            ],
        )
        .await
        .into()
    }
}

#[async_trait]
impl MessageStore for PostgrestStore {
    async fn insert_outgoing_message(
        &self,
        record: &OutgoingMessageRecord,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, MESSAGES_TABLE)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            table = MESSAGES_TABLE,
            integration_id = %record.integration_id,
            chat_id = %record.chat_id,
            "store_message_inserted"
        );

        Ok(())
    }
}
