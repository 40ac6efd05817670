//! Helpers shared by the unit tests: in-memory store and sender fakes and a
//! throwaway HTTP server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::credentials::Credentials;
use crate::store::{
    CredentialStore, IntegrationRecord, Lookup, MessageStore, OutgoingMessageRecord, StoreError,
    UserCredentialRecord,
};
use crate::upstream::{MessageSender, OutboundMessage, UpstreamResponse};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Poll `check` until it holds or two seconds pass.
async fn eventually<F: Fn() -> bool>(check: F) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// =============================================================================
// Credential Store
// =============================================================================

/// Stored form of a canned lookup result. `StoreError` is not `Clone`, so
/// failures are rebuilt on every call.
enum Canned<T> {
    Found(T),
    NotFound,
    Failed(String),
}

impl<T: Clone> Canned<T> {
    fn from_lookup(lookup: Lookup<T>) -> Self {
        match lookup {
            Lookup::Found(v) => Canned::Found(v),
            Lookup::NotFound => Canned::NotFound,
            Lookup::Failed(e) => Canned::Failed(e.to_string()),
        }
    }

    fn to_lookup(&self) -> Lookup<T> {
        match self {
            Canned::Found(v) => Lookup::Found(v.clone()),
            Canned::NotFound => Lookup::NotFound,
            Canned::Failed(body) => Lookup::Failed(StoreError::Status {
                status: 500,
                body: body.clone(),
            }),
        }
    }
}

/// Credential store answering from canned results. Unknown ids are not found.
#[derive(Default)]
pub struct FakeCredentialStore {
    users: HashMap<String, Canned<UserCredentialRecord>>,
    integrations: HashMap<String, Canned<IntegrationRecord>>,
    user_lookups: AtomicUsize,
    integration_lookups: AtomicUsize,
}

impl FakeCredentialStore {
    pub fn with_user(mut self, user_id: &str, lookup: Lookup<UserCredentialRecord>) -> Self {
        self.users.insert(user_id.to_string(), Canned::from_lookup(lookup));
        self
    }

    pub fn with_integration(mut self, integration_id: &str, lookup: Lookup<IntegrationRecord>) -> Self {
        self.integrations
            .insert(integration_id.to_string(), Canned::from_lookup(lookup));
        self
    }

    /// A generic store failure.
    pub fn failure<T>() -> Lookup<T> {
        Lookup::Failed(StoreError::Status {
            status: 500,
            body: "connection reset".to_string(),
        })
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn integration_lookups(&self) -> usize {
        self.integration_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn find_active_credential_by_user(&self, user_id: &str) -> Lookup<UserCredentialRecord> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(user_id)
            .map(Canned::to_lookup)
            .unwrap_or(Lookup::NotFound)
    }

    async fn find_integration_with_credential(
        &self,
        integration_id: &str,
    ) -> Lookup<IntegrationRecord> {
        self.integration_lookups.fetch_add(1, Ordering::SeqCst);
        self.integrations
            .get(integration_id)
            .map(Canned::to_lookup)
            .unwrap_or(Lookup::NotFound)
    }
}

// =============================================================================
// Message Store
// =============================================================================

/// Message store that keeps inserted rows in memory, or rejects every insert.
#[derive(Default)]
pub struct FakeMessageStore {
    fail: bool,
    attempts: AtomicUsize,
    records: Mutex<Vec<OutgoingMessageRecord>>,
}

impl FakeMessageStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<OutgoingMessageRecord> {
        self.records.lock().unwrap().clone()
    }

    pub async fn wait_for_attempts(&self, count: usize) {
        eventually(|| self.attempts() >= count).await;
    }

    pub async fn wait_for_records(&self, count: usize) -> Vec<OutgoingMessageRecord> {
        eventually(|| self.records.lock().unwrap().len() >= count).await;
        self.records()
    }
}

#[async_trait]
impl MessageStore for FakeMessageStore {
    async fn insert_outgoing_message(
        &self,
        record: &OutgoingMessageRecord,
    ) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Status {
                status: 503,
                body: "store unavailable".to_string(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// =============================================================================
// Sender
// =============================================================================

enum Reply {
    Respond(UpstreamResponse),
    Panic,
}

/// Sender that records every call and answers with a canned reply.
pub struct FakeSender {
    reply: Reply,
    calls: Mutex<Vec<(Credentials, OutboundMessage)>>,
}

impl FakeSender {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer 200 with `body` as JSON.
    pub fn ok(body: Value) -> Self {
        Self::new(Reply::Respond(UpstreamResponse {
            status: 200,
            body: body.to_string(),
        }))
    }

    /// Answer with an arbitrary status and raw body.
    pub fn status(status: u16, body: &str) -> Self {
        Self::new(Reply::Respond(UpstreamResponse {
            status,
            body: body.to_string(),
        }))
    }

    /// Panic instead of answering.
    pub fn panicking() -> Self {
        Self::new(Reply::Panic)
    }

    pub fn calls(&self) -> Vec<(Credentials, OutboundMessage)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for FakeSender {
    async fn send(
        &self,
        credentials: &Credentials,
        message: &OutboundMessage,
    ) -> Result<UpstreamResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((credentials.clone(), message.clone()));

        match &self.reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Panic => panic!("sender exploded"),
        }
    }
}
