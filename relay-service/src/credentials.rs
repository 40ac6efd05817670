//! Credential resolution.
//!
//! Credentials come from an ordered list of resolvers. Each one either
//! produces credentials, produces nothing, or aborts the request. The first
//! resolver that produces credentials wins; later ones are not consulted.
//!
//! ```text
//! user tier (fatal on store error) → integration tier (store error = nothing) → none
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::request::SendRequest;
use crate::store::{CredentialStore, Lookup, StoreError, UserCredentialRecord};

/// Credentials for a single Avito API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_url: String,
}

impl Credentials {
    /// Build credentials from a stored record, substituting `default_api_url`
    /// when the record has no URL.
    pub fn from_record(record: UserCredentialRecord, default_api_url: &str) -> Self {
        let api_url = record
            .api_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| default_api_url.to_string());

        Self {
            api_key: record.api_key,
            api_url,
        }
    }
}

/// A single tier of credential resolution.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Short name used in logs.
    fn tier(&self) -> &'static str;

    /// Try to resolve credentials for `request`.
    ///
    /// `Ok(None)` hands over to the next tier; `Err` aborts resolution.
    async fn resolve(
        &self,
        store: &dyn CredentialStore,
        request: &SendRequest,
        default_api_url: &str,
    ) -> Result<Option<Credentials>, StoreError>;
}

/// Tier 1: the caller's own active credential record.
///
/// Store failures other than "no row" are fatal.
pub struct UserTier;

#[async_trait]
impl CredentialResolver for UserTier {
    fn tier(&self) -> &'static str {
        "user"
    }

    async fn resolve(
        &self,
        store: &dyn CredentialStore,
        request: &SendRequest,
        default_api_url: &str,
    ) -> Result<Option<Credentials>, StoreError> {
        let Some(user_id) = request.user_id() else {
            return Ok(None);
        };

        match store.find_active_credential_by_user(user_id).await {
            Lookup::Found(record) => Ok(Some(Credentials::from_record(record, default_api_url))),
            Lookup::NotFound => {
                info!(user_id = %user_id, "user_credentials_not_found");
                Ok(None)
            }
            Lookup::Failed(e) => {
                error!(user_id = %user_id, error = %e, "user_credentials_lookup_failed");
                Err(e)
            }
        }
    }
}

/// Tier 2: the credential record joined to the integration.
///
/// Store failures are logged and treated as "nothing found".
pub struct IntegrationTier;

#[async_trait]
impl CredentialResolver for IntegrationTier {
    fn tier(&self) -> &'static str {
        "integration"
    }

    async fn resolve(
        &self,
        store: &dyn CredentialStore,
        request: &SendRequest,
        default_api_url: &str,
    ) -> Result<Option<Credentials>, StoreError> {
        let Some(integration_id) = request.integration_id() else {
            return Ok(None);
        };

        match store.find_integration_with_credential(integration_id).await {
            Lookup::Found(integration) => Ok(integration
                .credential
                .map(|record| Credentials::from_record(record, default_api_url))),
            Lookup::NotFound => {
                info!(integration_id = %integration_id, "integration_credentials_not_found");
                Ok(None)
            }
            Lookup::Failed(e) => {
                // TODO: decide with the integrations owners whether this should
                // fail like the user tier does instead of falling through.
                warn!(
                    integration_id = %integration_id,
                    error = %e,
                    "integration_credentials_lookup_failed"
                );
                Ok(None)
            }
        }
    }
}

/// Ordered credential resolution strategy.
pub struct CredentialChain {
    resolvers: Vec<Box<dyn CredentialResolver>>,
    default_api_url: String,
}

impl CredentialChain {
    pub fn new(resolvers: Vec<Box<dyn CredentialResolver>>, default_api_url: String) -> Self {
        Self {
            resolvers,
            default_api_url,
        }
    }

    /// The production order: user tier, then integration tier.
    pub fn standard(default_api_url: String) -> Self {
        Self::new(vec![Box::new(UserTier), Box::new(IntegrationTier)], default_api_url)
    }

    /// Run every tier in order until one yields credentials.
    pub async fn resolve(
        &self,
        store: &dyn CredentialStore,
        request: &SendRequest,
    ) -> Result<Option<Credentials>, StoreError> {
        for resolver in &self.resolvers {
            if let Some(credentials) = resolver
                .resolve(store, request, &self.default_api_url)
                .await?
            {
                info!(
                    tier = resolver.tier(),
                    api_url = %credentials.api_url,
                    "credentials_resolved"
                );
                return Ok(Some(credentials));
            }
        }

        Ok(None)
    }
}
