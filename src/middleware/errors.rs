// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error detail exposure and panic responses.
//!
//! Outside production a generic 500 is rewritten to carry the real cause.

use crate::error::{ErrorDetail, ErrorResponse, GENERIC_ERROR, GENERIC_MESSAGE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use std::sync::Arc;

/// Replace the generic message with the real cause when not in production.
pub async fn expose_error_detail(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if state.config.production {
        return response;
    }

    let status = response.status();
    (status, Json(ErrorResponse::new(GENERIC_ERROR, Some(detail)))).into_response()
}

/// Turn a handler panic into a JSON 500.
pub fn panic_response(err: Box<dyn Any + Send + 'static>, production: bool) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");

    let message = if production {
        GENERIC_MESSAGE.to_string()
    } else {
        detail
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(GENERIC_ERROR, Some(message))),
    )
        .into_response()
}
