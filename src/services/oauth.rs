// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google and GitHub OAuth clients.
//!
//! Handles:
//! - Authorization redirect URLs
//! - Code exchange at the provider token endpoint
//! - Profile fetch and normalization into a validated `ProviderProfile`

use crate::config::{Config, Endpoints, OAuthClientConfig};
use crate::error::AppError;
use crate::models::{Provider, ProviderProfile};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use validator::Validate;

/// OAuth client for both identity providers.
#[derive(Clone)]
pub struct OAuthService {
    http: reqwest::Client,
    endpoints: Endpoints,
    google: OAuthClientConfig,
    github: OAuthClientConfig,
}

impl OAuthService {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            endpoints: config.endpoints.clone(),
            google: config.google.clone(),
            github: config.github.clone(),
        }
    }

    fn client(&self, provider: Provider) -> &OAuthClientConfig {
        match provider {
            Provider::Google => &self.google,
            Provider::Github => &self.github,
        }
    }

    /// Callback URL registered for `provider`.
    pub fn callback_url(&self, provider: Provider) -> &str {
        &self.client(provider).callback_url
    }

    /// Build the provider authorization URL carrying `state`.
    pub fn authorize_url(&self, provider: Provider, state: &str) -> String {
        let client = self.client(provider);
        let base = match provider {
            Provider::Google => &self.endpoints.google_auth_url,
            Provider::Github => &self.endpoints.github_auth_url,
        };

        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            base,
            urlencoding::encode(&client.client_id),
            urlencoding::encode(&client.callback_url),
            urlencoding::encode(provider.scopes()),
            urlencoding::encode(state)
        )
    }

    /// Run the whole callback: exchange the code, fetch and validate the profile.
    pub async fn authenticate(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<ProviderProfile, AppError> {
        let access_token = self.exchange_code(provider, code).await?;
        let profile = self.fetch_profile(provider, &access_token).await?;
        profile
            .validate()
            .map_err(|e| AppError::InvalidProfile(e.to_string()))?;
        Ok(profile)
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, provider: Provider, code: &str) -> Result<String, AppError> {
        let client = self.client(provider);
        let token_url = match provider {
            Provider::Google => &self.endpoints.google_token_url,
            Provider::Github => &self.endpoints.github_token_url,
        };

        let response = self
            .http
            .post(token_url)
            // GitHub answers form-encoded unless asked for JSON
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", client.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Token request failed: {}", e)))?;

        let token: TokenResponse = check_response_json(response).await?;

        // GitHub reports a bad code with 200 and an `error` field.
        if let Some(error) = token.error {
            return Err(AppError::OAuth(format!(
                "{}: {}",
                error,
                token.error_description.unwrap_or_default()
            )));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::OAuth("Token response without access_token".to_string()))
    }

    /// Fetch the user's profile and map it to a `ProviderProfile`.
    ///
    /// The result is not validated yet; `authenticate` does that.
    pub async fn fetch_profile(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<ProviderProfile, AppError> {
        match provider {
            Provider::Google => {
                let info: GoogleUserInfo = self
                    .get_json(&self.endpoints.google_userinfo_url, access_token)
                    .await?;
                info.into_profile()
            }
            Provider::Github => {
                let base = self.endpoints.github_api_url.trim_end_matches('/');
                let user: GithubUser = self
                    .get_json(&format!("{}/user", base), access_token)
                    .await?;

                // The public email is often hidden; ask for the address list.
                let fallback = if user.email.as_deref().is_some_and(|e| !e.is_empty()) {
                    None
                } else {
                    match self
                        .get_json::<Vec<GithubEmail>>(&format!("{}/user/emails", base), access_token)
                        .await
                    {
                        Ok(emails) => pick_github_email(&emails),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to fetch GitHub emails");
                            None
                        }
                    }
                };

                user.into_profile(fallback)
            }
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::OAuth(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::OAuth(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::OAuth(format!("JSON parse error: {}", e)))
}

/// Token endpoint response. Both providers use these field names.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Google OpenID Connect `userinfo` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    pub fn into_profile(self) -> Result<ProviderProfile, AppError> {
        let email = non_empty(self.email)
            .ok_or_else(|| AppError::InvalidProfile("Google profile has no email".to_string()))?;
        Ok(ProviderProfile {
            provider: Provider::Google,
            provider_id: self.sub,
            name: non_empty(self.name).unwrap_or_else(|| email.clone()),
            email,
            avatar: non_empty(self.picture),
        })
    }
}

/// GitHub `/user` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl GithubUser {
    /// `fallback_email` comes from `/user/emails` when the profile email is hidden.
    pub fn into_profile(self, fallback_email: Option<String>) -> Result<ProviderProfile, AppError> {
        let email = non_empty(self.email)
            .or(fallback_email)
            .ok_or_else(|| AppError::InvalidProfile("GitHub profile has no email".to_string()))?;
        Ok(ProviderProfile {
            provider: Provider::Github,
            provider_id: self.id.to_string(),
            name: non_empty(self.name).unwrap_or(self.login),
            email,
            avatar: non_empty(self.avatar_url),
        })
    }
}

/// One entry of GitHub `/user/emails`.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Primary verified address, else the first verified one.
pub fn pick_github_email(emails: &[GithubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.clone())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> OAuthService {
        OAuthService::new(reqwest::Client::new(), &Config::test_default())
    }

    #[test]
    fn test_authorize_url_google() {
        let url = service().authorize_url(Provider::Google, "abc");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test_google_id"));
        assert!(url.contains("scope=profile%20email"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.ends_with("state=abc"));
    }

    #[test]
    fn test_authorize_url_github() {
        let url = service().authorize_url(Provider::Github, "xyz");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("client_id=test_github_id"));
    }

    #[test]
    fn test_google_profile_mapping() {
        let info: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1098",
            "email": "ada@example.com",
            "picture": "https://lh3.example.com/a.png"
        }))
        .unwrap();

        let profile = info.into_profile().unwrap();
        assert_eq!(profile.provider_id, "1098");
        assert_eq!(profile.name, "ada@example.com");
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_google_profile_without_email_is_rejected() {
        let info = GoogleUserInfo {
            sub: "1".to_string(),
            email: None,
            name: Some("Ada".to_string()),
            picture: None,
        };
        assert!(matches!(info.into_profile(), Err(AppError::InvalidProfile(_))));
    }

    #[test]
    fn test_github_profile_uses_login_and_fallback_email() {
        let user = GithubUser {
            id: 583231,
            login: "octocat".to_string(),
            name: None,
            email: Some(String::new()),
            avatar_url: Some("https://avatars.githubusercontent.com/u/583231".to_string()),
        };

        let profile = user
            .into_profile(Some("octocat@github.com".to_string()))
            .unwrap();
        assert_eq!(profile.provider_id, "583231");
        assert_eq!(profile.name, "octocat");
        assert_eq!(profile.email, "octocat@github.com");
    }

    #[test]
    fn test_github_profile_without_any_email_is_rejected() {
        let user = GithubUser {
            id: 1,
            login: "ghost".to_string(),
            name: None,
            email: None,
            avatar_url: None,
        };
        assert!(matches!(user.into_profile(None), Err(AppError::InvalidProfile(_))));
    }

    #[test]
    fn test_pick_github_email() {
        let emails = vec![
            GithubEmail {
                email: "old@example.com".to_string(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "unverified@example.com".to_string(),
                primary: true,
                verified: false,
            },
        ];
        assert_eq!(pick_github_email(&emails).as_deref(), Some("old@example.com"));

        let mut with_primary = emails.clone();
        with_primary.push(GithubEmail {
            email: "main@example.com".to_string(),
            primary: true,
            verified: true,
        });
        assert_eq!(
            pick_github_email(&with_primary).as_deref(),
            Some("main@example.com")
        );

        assert_eq!(pick_github_email(&[]), None);
    }
}
