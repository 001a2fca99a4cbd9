// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-client request rate limiting.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter keyed by client address.
pub type ClientLimiter = DefaultKeyedRateLimiter<String>;

/// Allow bursts of `max` requests, refilled evenly over `window_secs`.
pub fn build_limiter(max: u32, window_secs: u64) -> anyhow::Result<ClientLimiter> {
    let burst = NonZeroU32::new(max).ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_MAX must be > 0"))?;
    let period = Duration::from_secs(window_secs) / max;
    let quota = Quota::with_period(period)
        .ok_or_else(|| anyhow::anyhow!("rate limit window too short"))?
        .allow_burst(burst);
    Ok(RateLimiter::keyed(quota))
}

/// Client key: last `X-Forwarded-For` hop, else the peer address.
///
/// Only the hop appended by the single proxy in front of us is trusted;
/// anything to its left is client-supplied.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject requests over the per-client quota with 429.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if state.limiter.check_key(&key).is_err() {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
