// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather and news proxy routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

pub const WEATHER_FAILED: &str = "Failed to fetch weather data";
pub const NEWS_FAILED: &str = "Failed to fetch news data";

/// API routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/weather/{city}", get(get_weather))
        .route("/api/news/{category}", get(get_news))
}

/// Current weather for a city, relayed from the weather provider.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(city): Path<String>,
) -> Result<Json<Value>> {
    let data = state.upstream.weather(&city).await.map_err(|e| {
        tracing::error!(error = %e, city = %city, user_id = %user.id, "Weather lookup failed");
        AppError::ProxyFailed(WEATHER_FAILED)
    })?;

    Ok(Json(data))
}

/// Top headlines for a category, relayed from the news provider.
async fn get_news(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(category): Path<String>,
) -> Result<Json<Value>> {
    let data = state.upstream.news(&category).await.map_err(|e| {
        tracing::error!(
            error = %e,
            category = %category,
            user_id = %user.id,
            "News lookup failed"
        );
        AppError::ProxyFailed(NEWS_FAILED)
    })?;

    Ok(Json(data))
}
