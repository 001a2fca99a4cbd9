// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;

use crate::error::AppError;
use crate::middleware::auth::{require_auth, resolve_session};
use crate::middleware::errors::{expose_error_detail, panic_response};
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::security::add_security_headers;
use crate::AppState;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// JSON 404 for anything no route or static file matched.
async fn not_found() -> AppError {
    AppError::NotFound
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the base URL and localhost (for dev)
    let base_url = state.config.base_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == base_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Static client. Misses fall through to the JSON 404.
    let public_dir = &state.config.public_dir;
    let static_files = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .call_fallback_on_method_not_allowed(true)
        .fallback(not_found.into_service());

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/healthz", get(health_check))
        .route_service("/login", ServeFile::new(public_dir.join("index.html")))
        .merge(auth::routes());

    // Protected routes (auth required)
    let protected_routes = api::routes().route_layer(middleware::from_fn(require_auth));

    // Static files are served ahead of rate limiting and session lookup.
    let production = state.config.production;
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_error_detail,
        ))
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors)
        .layer(CatchPanicLayer::custom(move |err| {
            panic_response(err, production)
        }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
