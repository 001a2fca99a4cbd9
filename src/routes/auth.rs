// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google and GitHub OAuth login routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::OAUTH_STATE_TTL_SECS;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    clear_nonce_cookie, clear_session_cookie, nonce_cookie, session_cookie, CurrentSession,
    NONCE_COOKIE, SESSION_COOKIE,
};
use crate::models::{Provider, ProviderProfile, User};
use crate::services::oauth_state::{nonce_matches, sign_state, verify_state};
use crate::services::session::random_token;
use crate::services::find_or_create_user;
use crate::time_utils::unix_millis;
use crate::AppState;

pub const AUTH_FAILED: &str = "Authentication failed";
pub const LOGIN_FAILED: &str = "Login failed";

/// Bytes of entropy in the OAuth nonce.
const NONCE_BYTES: usize = 16;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/status", get(auth_status))
        .route("/auth/logout", post(logout))
        .route("/auth/{provider}", get(auth_start))
        .route("/auth/{provider}/callback", get(auth_callback))
}

fn parse_provider(raw: &str) -> Result<Provider> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Redirect to the login page with an error message.
fn login_error(message: &str) -> Redirect {
    Redirect::to(&format!("/login?error={}", urlencoding::encode(message)))
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let provider = parse_provider(&provider)?;

    let nonce = random_token(NONCE_BYTES)?;
    let oauth_state = sign_state(
        provider,
        &nonce,
        unix_millis(Utc::now()),
        &state.config.oauth_state_key,
    )?;
    let auth_url = state.oauth.authorize_url(provider, &oauth_state);

    tracing::info!(
        provider = %provider,
        callback = %state.oauth.callback_url(provider),
        "Starting OAuth flow"
    );

    let jar = jar.add(nonce_cookie(provider, nonce, state.config.production));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - exchange code, resolve user, create session.
///
/// Failures never surface as errors; they redirect to `/login?error=...`.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let provider = parse_provider(&provider)?;
    let secure = state.config.production;

    let nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let previous_token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(clear_nonce_cookie(provider, secure));

    let profile = match verify_callback(&state, provider, nonce.as_deref(), &params).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "OAuth callback rejected");
            return Ok((jar, login_error(AUTH_FAILED)));
        }
    };

    let user = match find_or_create_user(state.users.as_ref(), &profile).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(provider = %provider, error = %e, "Failed to resolve user");
            return Ok((jar, login_error(AUTH_FAILED)));
        }
    };

    // Never carry a session across logins
    if let Some(old) = previous_token {
        if let Err(e) = state.sessions.destroy(&old).await {
            tracing::warn!(error = %e, "Failed to destroy previous session");
        }
    }

    let token = match state.sessions.issue(&user.id).await {
        Ok((token, _)) => token,
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Failed to create session");
            return Ok((jar, login_error(LOGIN_FAILED)));
        }
    };

    tracing::info!(provider = %provider, user_id = %user.id, "Login successful");

    let jar = jar.add(session_cookie(token, secure));
    Ok((jar, Redirect::to("/")))
}

/// Check the provider result, state and nonce, then fetch the profile.
async fn verify_callback(
    state: &AppState,
    provider: Provider,
    nonce: Option<&str>,
    params: &CallbackParams,
) -> Result<ProviderProfile> {
    if let Some(error) = &params.error {
        return Err(AppError::OAuth(format!(
            "Provider returned error: {} {}",
            error,
            params.error_description.as_deref().unwrap_or_default()
        )));
    }

    let raw_state = params
        .state
        .as_deref()
        .ok_or_else(|| AppError::OAuth("Missing state".to_string()))?;

    let verified = verify_state(
        raw_state,
        &state.config.oauth_state_key,
        unix_millis(Utc::now()),
        OAUTH_STATE_TTL_SECS as u128 * 1000,
    )
    .ok_or_else(|| AppError::OAuth("Invalid or expired state".to_string()))?;

    if verified.provider != provider {
        return Err(AppError::OAuth(format!(
            "State issued for {}, returned to {}",
            verified.provider, provider
        )));
    }

    let nonce = nonce.ok_or_else(|| AppError::OAuth("Missing nonce cookie".to_string()))?;
    if !nonce_matches(&verified.nonce, nonce) {
        return Err(AppError::OAuth("Nonce mismatch".to_string()));
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::OAuth("Missing authorization code".to_string()))?;

    state.oauth.authenticate(provider, code).await
}

/// Response for `/auth/status`.
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

async fn auth_status(Extension(current): Extension<CurrentSession>) -> Json<AuthStatus> {
    Json(AuthStatus {
        authenticated: current.user.is_some(),
        user: current.user,
    })
}

/// Logout - destroy the server-side session and expire the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.sessions.destroy(cookie.value()).await {
            tracing::error!(error = %e, "Logout failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout").into_response();
        }
    }

    let jar = jar.add(clear_session_cookie(state.config.production));
    (jar, "Logged out successfully").into_response()
}
