//! User model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Identity provider a user logged in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }

    /// Scopes requested on the authorization redirect.
    pub fn scopes(&self) -> &'static str {
        match self {
            Provider::Google => "profile email",
            Provider::Github => "user:email",
        }
    }

    /// Path of this provider's OAuth callback.
    pub fn callback_path(&self) -> String {
        format!("/auth/{}/callback", self.as_str())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            _ => Err(()),
        }
    }
}

/// User profile stored in the user store and returned by `/auth/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal id (UUID v4)
    pub id: String,
    /// Google account subject, for Google logins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    /// GitHub numeric user id, for GitHub logins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_id: Option<String>,
    pub email: String,
    pub name: String,
    /// Profile picture URL
    #[serde(default)]
    pub avatar: Option<String>,
    /// When the user first logged in
    pub created_at: String,
}

impl User {
    /// Build a fresh record for a first login.
    pub fn from_profile(profile: &ProviderProfile, created_at: String) -> Self {
        let (google_id, github_id) = match profile.provider {
            Provider::Google => (Some(profile.provider_id.clone()), None),
            Provider::Github => (None, Some(profile.provider_id.clone())),
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            google_id,
            github_id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            avatar: profile.avatar.clone(),
            created_at,
        }
    }

    /// The (provider, provider id) pair this user is keyed by.
    pub fn identity(&self) -> Option<(Provider, &str)> {
        match (&self.google_id, &self.github_id) {
            (Some(id), _) => Some((Provider::Google, id.as_str())),
            (None, Some(id)) => Some((Provider::Github, id.as_str())),
            (None, None) => None,
        }
    }
}

/// Storage key for a provider identity, e.g. `google:1234`.
pub fn identity_key(provider: Provider, provider_id: &str) -> String {
    format!("{}:{}", provider.as_str(), provider_id)
}

/// Provider profile after normalization, validated before it touches the store.
#[derive(Debug, Clone, Validate)]
pub struct ProviderProfile {
    pub provider: Provider,
    #[validate(length(min = 1, max = 255))]
    pub provider_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url)]
    pub avatar: Option<String>,
}
