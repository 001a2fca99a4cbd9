// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session stored under the SHA-256 of its cookie token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    /// RFC 3339, UTC
    pub issued_at: String,
    /// RFC 3339, UTC. Fixed at issuance.
    pub expires_at: String,
}

impl SessionRecord {
    /// Whether the session is past its expiry. Unparseable expiries count as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|exp| exp.with_timezone(&Utc) <= now)
            .unwrap_or(true)
    }
}
