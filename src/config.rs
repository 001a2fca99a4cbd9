// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. The OAuth state signing key is
//! derived from `SESSION_SECRET` so only one secret has to be provisioned.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// How many successive ports are tried when the configured one is busy.
pub const PORT_RETRY_ATTEMPTS: u16 = 10;

/// Session lifetime, fixed from issuance.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Lifetime of the OAuth state parameter and its nonce cookie.
pub const OAUTH_STATE_TTL_SECS: i64 = 10 * 60;

/// Weather units requested from the upstream provider.
pub const WEATHER_UNITS: &str = "metric";

/// Country requested from the news provider.
pub const NEWS_COUNTRY: &str = "us";

const STATE_KEY_INFO: &[u8] = b"daybrief oauth state v1";

/// Which backend holds users and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Client registration for one OAuth provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute redirect URI registered with the provider.
    pub callback_url: String,
}

/// Remote endpoints. Overridable so tests can point at a local mock.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    pub github_auth_url: String,
    pub github_token_url: String,
    /// Base of the GitHub REST API (`/user`, `/user/emails`).
    pub github_api_url: String,
    pub weather_url: String,
    pub news_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            github_auth_url: "https://github.com/login/oauth/authorize".to_string(),
            github_token_url: "https://github.com/login/oauth/access_token".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            news_url: "https://newsapi.org/v2/top-headlines".to_string(),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port (first one tried)
    pub port: u16,
    /// Public base URL, used for callback URLs and CORS
    pub base_url: String,
    /// `APP_ENV=production`: secure cookies, no error details
    pub production: bool,
    /// Backend for users and sessions
    pub store_backend: StoreBackend,
    /// GCP project holding the Firestore database
    pub gcp_project_id: String,
    /// Directory with the browser client
    pub public_dir: PathBuf,
    /// Requests allowed per client per window
    pub rate_limit_max: u32,
    /// Rate limit window length in seconds
    pub rate_limit_window_secs: u64,
    pub endpoints: Endpoints,

    // --- Secrets ---
    pub google: OAuthClientConfig,
    pub github: OAuthClientConfig,
    pub weather_api_key: String,
    pub news_api_key: String,
    /// HMAC key for the OAuth state parameter (derived from `SESSION_SECRET`)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        let base_url = "http://localhost:3000".to_string();
        Self {
            port: DEFAULT_PORT,
            production: false,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            public_dir: PathBuf::from("public"),
            rate_limit_max: 100,
            rate_limit_window_secs: 15 * 60,
            endpoints: Endpoints::default(),
            google: OAuthClientConfig {
                client_id: "test_google_id".to_string(),
                client_secret: "test_google_secret".to_string(),
                callback_url: format!("{}/auth/google/callback", base_url),
            },
            github: OAuthClientConfig {
                client_id: "test_github_id".to_string(),
                client_secret: "test_github_secret".to_string(),
                callback_url: format!("{}/auth/github/callback", base_url),
            },
            weather_api_key: "test_weather_key".to_string(),
            news_api_key: "test_news_key".to_string(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!!".to_vec(),
            base_url,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = match env::var("PORT") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", v.clone()))?,
            Err(_) => DEFAULT_PORT,
        };

        let base_url = env::var("BASE_URL")
            .or_else(|_| env::var("RENDER_EXTERNAL_URL"))
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        let base_url = base_url.trim_end_matches('/').to_string();

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        let mut endpoints = Endpoints::default();
        if let Ok(url) = env::var("WEATHER_API_URL") {
            endpoints.weather_url = url;
        }
        if let Ok(url) = env::var("NEWS_API_URL") {
            endpoints.news_url = url;
        }

        let session_secret = required("SESSION_SECRET")?;

        Ok(Self {
            port,
            production,
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            rate_limit_max: parse_or("RATE_LIMIT_MAX", 100)?,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
            endpoints,
            google: OAuthClientConfig {
                client_id: required("GOOGLE_CLIENT_ID")?,
                client_secret: required("GOOGLE_CLIENT_SECRET")?,
                callback_url: env::var("GOOGLE_CALLBACK_URL")
                    .unwrap_or_else(|_| format!("{}/auth/google/callback", base_url)),
            },
            github: OAuthClientConfig {
                client_id: required("GITHUB_CLIENT_ID")?,
                client_secret: required("GITHUB_CLIENT_SECRET")?,
                callback_url: env::var("GITHUB_CALLBACK_URL")
                    .unwrap_or_else(|_| format!("{}/auth/github/callback", base_url)),
            },
            weather_api_key: required("WEATHER_API_KEY")?,
            news_api_key: required("NEWS_API_KEY")?,
            oauth_state_key: derive_state_key(session_secret.as_bytes())?,
            base_url,
        })
    }
}

/// Derive the OAuth state HMAC key from the session secret.
pub fn derive_state_key(secret: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = vec![0u8; 32];
    hk.expand(STATE_KEY_INFO, &mut okm)
        .map_err(|_| ConfigError::Invalid("SESSION_SECRET", "<redacted>".to_string()))?;
    Ok(okm)
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, v.clone())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
