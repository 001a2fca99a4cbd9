// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (document id `{provider}:{provider_id}`, so identities are unique)
//! - Sessions (document id is the token hash)

use crate::db::{collections, SessionStore, UserStore};
use crate::error::AppError;
use crate::models::user::identity_key;
use crate::models::{Provider, SessionRecord, User};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Session document. Carries its own key so expired ones can be deleted
/// straight from a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDoc {
    key: String,
    user_id: String,
    issued_at: String,
    expires_at: String,
}

impl SessionDoc {
    fn new(key: &str, record: &SessionRecord) -> Self {
        Self {
            key: key.to_string(),
            user_id: record.user_id.clone(),
            issued_at: record.issued_at.clone(),
            expires_at: record.expires_at.clone(),
        }
    }
}

impl From<SessionDoc> for SessionRecord {
    fn from(doc: SessionDoc) -> Self {
        Self {
            user_id: doc.user_id,
            issued_at: doc.issued_at,
            expires_at: doc.expires_at,
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. All operations return a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Delete session documents in transactional batches.
    async fn batch_delete_sessions(&self, keys: &[String]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in keys.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for key in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collections::SESSIONS)
                    .document_id(key)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add session deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit session deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserStore for FirestoreDb {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let id = id.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("id").eq(id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn find_by_provider(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&identity_key(provider, provider_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_if_absent(&self, user: User) -> Result<User, AppError> {
        let (provider, provider_id) = user
            .identity()
            .ok_or_else(|| AppError::InvalidProfile("user has no provider id".to_string()))?;
        let doc_id = identity_key(provider, provider_id);

        // `insert` fails on an existing document, which makes the identity
        // key the uniqueness constraint.
        let inserted: Result<User, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&doc_id)
            .object(&user)
            .execute()
            .await;

        match inserted {
            Ok(stored) => Ok(stored),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(identity = %doc_id, "User already exists, loading it");
                self.find_by_provider(provider, provider_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!("User {} vanished after conflict", doc_id))
                    })
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}

// ─── Session Operations ──────────────────────────────────────

#[async_trait]
impl SessionStore for FirestoreDb {
    async fn put_session(&self, key: &str, record: &SessionRecord) -> Result<(), AppError> {
        let doc = SessionDoc::new(key, record);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(key)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, AppError> {
        let doc: Option<SessionDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(doc.map(SessionRecord::from))
    }

    async fn delete_session(&self, key: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(key)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        // Expiries are stored as `Z`-suffixed RFC 3339, which sorts lexically.
        let cutoff = format_utc_rfc3339(now);
        let expired: Vec<SessionDoc> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.for_all([q.field("expires_at").less_than_or_equal(cutoff.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let keys: Vec<String> = expired.into_iter().map(|doc| doc.key).collect();
        self.batch_delete_sessions(&keys).await?;

        tracing::debug!(count = keys.len(), "Purged expired sessions");
        Ok(keys.len())
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}
