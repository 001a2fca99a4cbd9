// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daybrief API Server
//!
//! Serves the browser client, handles Google and GitHub login, and proxies
//! weather and news lookups for logged-in users.

use anyhow::Context;
use daybrief::{
    config::{Config, PORT_RETRY_ATTEMPTS},
    db::Stores,
    server::bind_with_retry,
    services::spawn_sweeper,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Daybrief");

    // Users and sessions (falls back to memory if Firestore is down)
    let stores = Stores::connect(&config).await;
    tracing::info!(backend = stores.sessions.backend(), "Session store ready");

    let state = Arc::new(AppState::new(config.clone(), stores)?);

    let _sweeper = spawn_sweeper(state.sessions.clone(), state.limiter.clone());

    // Build router
    let app = daybrief::routes::create_router(state);

    // Start server
    let listener = bind_with_retry(config.port, PORT_RETRY_ATTEMPTS).await?;
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Server listening");
    tracing::info!(
        base_url = %config.base_url,
        google_callback = %config.google.callback_url,
        github_callback = %config.github.callback_url,
        "OAuth callback URLs"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,daybrief=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
