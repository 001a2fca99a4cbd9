// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic cleanup of expired sessions and idle rate-limiter keys.

use crate::middleware::ClientLimiter;
use crate::services::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often the sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Run one sweep. Returns the number of sessions purged.
pub async fn sweep_once(sessions: &SessionManager, limiter: &ClientLimiter) -> usize {
    limiter.retain_recent();
    limiter.shrink_to_fit();

    match sessions.purge_expired().await {
        Ok(purged) => {
            if purged > 0 {
                tracing::info!(purged, backend = sessions.backend(), "Purged expired sessions");
            }
            purged
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session sweep failed");
            0
        }
    }
}

/// Spawn the sweeper on the current runtime.
pub fn spawn_sweeper(sessions: SessionManager, limiter: Arc<ClientLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_once(&sessions, &limiter).await;
        }
    })
}
