// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by `DashMap`.

use crate::db::{SessionStore, UserStore};
use crate::error::AppError;
use crate::models::user::identity_key;
use crate::models::{Provider, SessionRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users and sessions held in memory. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    /// User id -> user
    users: DashMap<String, User>,
    /// Identity key -> user id
    identities: DashMap<String, String>,
    /// Token hash -> session
    sessions: DashMap<String, SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of stored sessions, expired or not.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_provider(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        let key = identity_key(provider, provider_id);
        let Some(user_id) = self.identities.get(&key).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&user_id).await
    }

    async fn create_if_absent(&self, user: User) -> Result<User, AppError> {
        let (provider, provider_id) = user
            .identity()
            .ok_or_else(|| AppError::InvalidProfile("user has no provider id".to_string()))?;
        let key = identity_key(provider, provider_id);

        // The identity entry guard serializes concurrent first logins.
        match self.identities.entry(key) {
            Entry::Occupied(existing) => {
                let id = existing.get().clone();
                drop(existing);
                self.users
                    .get(&id)
                    .map(|u| u.clone())
                    .ok_or_else(|| AppError::Database(format!("dangling identity for {}", id)))
            }
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put_session(&self, key: &str, record: &SessionRecord) -> Result<(), AppError> {
        self.sessions.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, AppError> {
        Ok(self.sessions.get(key).map(|s| s.clone()))
    }

    async fn delete_session(&self, key: &str) -> Result<(), AppError> {
        self.sessions.remove(key);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
