// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session issuance, resolution and destruction.
//!
//! The browser holds an opaque random token; the store only ever sees its
//! SHA-256, so a leaked store dump cannot be replayed as cookies.

use crate::db::SessionStore;
use crate::error::AppError;
use crate::models::SessionRecord;
use crate::time_utils::format_utc_rfc3339;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Bytes of entropy in a session token.
const TOKEN_BYTES: usize = 32;

/// Generate a URL-safe random token with `len` bytes of entropy.
pub fn random_token(len: usize) -> Result<String, AppError> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Store key for a token.
pub fn token_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issues and resolves sessions over any `SessionStore`.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Create a session for `user_id`. Returns the cookie token.
    pub async fn issue(&self, user_id: &str) -> Result<(String, SessionRecord), AppError> {
        let token = random_token(TOKEN_BYTES)?;
        let now = Utc::now();
        let record = SessionRecord {
            user_id: user_id.to_string(),
            issued_at: format_utc_rfc3339(now),
            expires_at: format_utc_rfc3339(now + self.ttl),
        };
        self.store.put_session(&token_key(&token), &record).await?;
        tracing::debug!(user_id, backend = self.backend(), "Session issued");
        Ok((token, record))
    }

    /// Look up a live session. Expired sessions are deleted and reported as absent.
    pub async fn resolve(&self, token: &str) -> Result<Option<SessionRecord>, AppError> {
        let key = token_key(token);
        let Some(record) = self.store.get_session(&key).await? else {
            return Ok(None);
        };

        if record.is_expired(Utc::now()) {
            if let Err(e) = self.store.delete_session(&key).await {
                tracing::warn!(error = %e, "Failed to delete expired session");
            }
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Destroy the session behind `token`. Unknown tokens are not an error.
    pub async fn destroy(&self, token: &str) -> Result<(), AppError> {
        self.store.delete_session(&token_key(token)).await
    }

    /// Delete every expired session.
    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        self.store.purge_expired(Utc::now()).await
    }
}
