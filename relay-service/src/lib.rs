//! Avito Relay - sends chat messages to Avito on behalf of users and integrations.
//!
//! A request names a chat and a message plus a user and/or integration id.
//! The relay resolves which Avito credentials to use, forwards the message
//! and, for integrations, records the outgoing message in the data store.
//!
//! ## Architecture
//!
//! ```text
//! HTTP → web → Dispatcher → CredentialChain → store (PostgREST)
//!                         → MessageSender (Avito API)
//!                         → MessageStore (detached audit write)
//! ```

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod store;
pub mod upstream;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use credentials::{CredentialChain, Credentials};
pub use dispatch::Dispatcher;
pub use error::DispatchError;
pub use request::SendRequest;
pub use store::{CredentialStore, Lookup, MessageStore, PostgrestStore, StoreError};
pub use upstream::{AvitoClient, MessageSender};
pub use web::AppState;
