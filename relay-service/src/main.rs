//! Avito Relay server.
//!
//! This binary:
//! - Loads and validates configuration once at startup
//! - Builds the store client, the Avito client and the dispatcher
//! - Serves the send endpoint until SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use avito_relay::web::{router, AppState};
use avito_relay::{AvitoClient, Config, CredentialChain, Dispatcher, PostgrestStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Missing store settings are fatal
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        store_url = %config.store_url,
        default_api_url = %config.default_api_url,
        upstream_timeout_ms = config.upstream_timeout_ms,
        store_timeout_ms = config.store_timeout_ms,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let store = Arc::new(
        PostgrestStore::new(
            &config.store_url,
            config.store_service_key.clone(),
            config.store_timeout(),
        )
        .context("Failed to build store client")?,
    );
    let sender = Arc::new(AvitoClient::new(config.upstream_timeout())?);

    let dispatcher = Dispatcher::new(
        store.clone(),
        store,
        sender,
        CredentialChain::standard(config.default_api_url.clone()),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, dispatcher));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(addr))
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM, then let in-flight sends finish.
///
/// A signal source that cannot be installed is logged and never fires; the
/// other one still stops the relay.
async fn shutdown_signal(addr: SocketAddr) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "relay_sigint_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "relay_sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(
        signal = received,
        address = %addr,
        "relay_shutting_down"
    );
}
