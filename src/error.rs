// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    /// A proxy endpoint failed; the message is the only thing the client sees.
    #[error("{0}")]
    ProxyFailed(&'static str),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Invalid provider profile: {0}")]
    InvalidProfile(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            error: error.into(),
            message,
        }
    }
}

/// Real cause of a generic 500, attached to the response so a later layer
/// can reveal it outside production.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

pub const GENERIC_ERROR: &str = "Something went wrong";
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut detail = None;
        let (status, body) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Not authenticated", None),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(
                    "Not Found",
                    Some("The requested resource was not found".to_string()),
                ),
            ),
            AppError::ProxyFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(*msg, None),
            ),
            AppError::OAuth(msg) | AppError::InvalidProfile(msg) => {
                tracing::warn!(error = %msg, "Authentication error");
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("Authentication failed", None),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(
                        "Database service unavailable",
                        Some("Please try again later".to_string()),
                    ),
                )
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new(
                    "Too Many Requests",
                    Some("Too many requests, please try again later.".to_string()),
                ),
            ),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream error");
                detail = Some(msg.clone());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(GENERIC_ERROR, Some(GENERIC_MESSAGE.to_string())),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                detail = Some(err.to_string());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(GENERIC_ERROR, Some(GENERIC_MESSAGE.to_string())),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
