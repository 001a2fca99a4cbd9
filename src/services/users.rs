// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maps a validated provider profile to the local user record.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{ProviderProfile, User};
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;

/// Look up the user for `profile`, creating it on first login.
///
/// Existing records are returned as stored; later logins never rewrite them.
pub async fn find_or_create_user(
    store: &dyn UserStore,
    profile: &ProviderProfile,
) -> Result<User, AppError> {
    if let Some(user) = store
        .find_by_provider(profile.provider, &profile.provider_id)
        .await?
    {
        tracing::debug!(
            provider = %profile.provider,
            user_id = %user.id,
            "Existing user logged in"
        );
        return Ok(user);
    }

    let candidate = User::from_profile(profile, format_utc_rfc3339(Utc::now()));
    let user = store.create_if_absent(candidate).await?;

    tracing::info!(
        provider = %profile.provider,
        user_id = %user.id,
        "Created user on first login"
    );

    Ok(user)
}
