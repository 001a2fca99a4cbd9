// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.
//!
//! Two stages run in order:
//! 1. `resolve_session` turns the session cookie into a `CurrentSession`
//! 2. `require_auth` rejects requests whose `CurrentSession` has no user

use crate::config::{OAUTH_STATE_TTL_SECS, SESSION_TTL_SECS};
use crate::error::AppError;
use crate::models::{Provider, User};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "daybrief_session";

/// Nonce cookie paired with the OAuth state parameter.
pub const NONCE_COOKIE: &str = "daybrief_oauth_nonce";

/// Result of session resolution, attached to every request.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    /// Raw cookie token, if the request carried one
    pub token: Option<String>,
    /// The logged-in user, if the token maps to a live session
    pub user: Option<User>,
}

/// Authenticated user, present only behind `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Resolve the session cookie into a `CurrentSession` extension.
///
/// Store failures are logged and treated as "not logged in".
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let current = match jar.get(SESSION_COOKIE) {
        Some(cookie) => load_session(&state, cookie.value()).await,
        None => CurrentSession::default(),
    };

    request.extensions_mut().insert(current);
    next.run(request).await
}

async fn load_session(state: &AppState, token: &str) -> CurrentSession {
    let mut current = CurrentSession {
        token: Some(token.to_string()),
        user: None,
    };

    let record = match state.sessions.resolve(token).await {
        Ok(Some(record)) => record,
        Ok(None) => return current,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            return current;
        }
    };

    match state.users.find_by_id(&record.user_id).await {
        Ok(Some(user)) => current.user = Some(user),
        Ok(None) => {
            tracing::warn!(user_id = %record.user_id, "Session refers to unknown user");
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %record.user_id, "User lookup failed");
        }
    }

    current
}

/// Middleware that requires a logged-in user.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentSession>()
        .and_then(|s| s.user.clone())
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

// ─── Cookies ─────────────────────────────────────────────────

/// Session cookie carrying `token`, valid for the fixed session lifetime.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Expired session cookie with the same attributes as the live one.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Nonce cookie, only sent back to `provider`'s callback.
pub fn nonce_cookie(provider: Provider, nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, nonce))
        .path(provider.callback_path())
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS))
        .build()
}

pub fn clear_nonce_cookie(provider: Provider, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, ""))
        .path(provider.callback_path())
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}
