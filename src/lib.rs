// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daybrief: weather and headlines behind a Google or GitHub login.
//!
//! This crate provides the server: OAuth login, cookie sessions, and
//! authenticated proxy endpoints for the weather and news providers.

pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod time_utils;

use config::{Config, SESSION_TTL_SECS};
use db::{Stores, UserStore};
use middleware::rate_limit::{build_limiter, ClientLimiter};
use services::{OAuthService, SessionManager, UpstreamClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub oauth: OAuthService,
    pub upstream: UpstreamClient,
    pub limiter: Arc<ClientLimiter>,
}

impl AppState {
    /// Wire services over the selected stores.
    pub fn new(config: Config, stores: Stores) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("daybrief/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let limiter = build_limiter(config.rate_limit_max, config.rate_limit_window_secs)?;

        Ok(Self {
            users: stores.users,
            sessions: SessionManager::new(
                stores.sessions,
                chrono::Duration::seconds(SESSION_TTL_SECS),
            ),
            oauth: OAuthService::new(http.clone(), &config),
            upstream: UpstreamClient::new(http, &config),
            limiter: Arc::new(limiter),
            config,
        })
    }
}
