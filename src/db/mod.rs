//! Database layer: user and session stores.
//!
//! Two backends implement the store traits:
//! - `FirestoreDb`: persistent, survives restarts
//! - `MemoryStore`: process-local, lost on restart

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{Provider, SessionRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    /// Users, keyed by `{provider}:{provider_id}`
    pub const USERS: &str = "users";
    /// Sessions, keyed by the hex SHA-256 of the cookie token
    pub const SESSIONS: &str = "sessions";
}

/// Persistent user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_provider(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<User>, AppError>;

    /// Insert `user` unless one with the same provider identity exists.
    ///
    /// Returns the stored record, which is the existing one on conflict.
    async fn create_if_absent(&self, user: User) -> Result<User, AppError>;
}

/// Session records keyed by token hash.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put_session(&self, key: &str, record: &SessionRecord) -> Result<(), AppError>;

    async fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, AppError>;

    async fn delete_session(&self, key: &str) -> Result<(), AppError>;

    /// Remove every session expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// The stores selected at startup.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    /// Process-local stores.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            sessions: store,
        }
    }

    /// Select stores according to `STORE_BACKEND`.
    ///
    /// If Firestore is selected but unreachable the error is logged and the
    /// memory backend is used instead.
    pub async fn connect(config: &Config) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                tracing::info!("Using memory store for users and sessions");
                Self::memory()
            }
            StoreBackend::Firestore => match FirestoreDb::new(&config.gcp_project_id).await {
                Ok(db) => {
                    let db = Arc::new(db);
                    Self {
                        users: db.clone(),
                        sessions: db,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to connect to Firestore, falling back to memory store"
                    );
                    Self::memory()
                }
            },
        }
    }
}
