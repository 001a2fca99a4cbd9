// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather and news API client.
//!
//! Each lookup makes exactly one upstream request and returns the provider's
//! JSON untouched. Errors carry the upstream detail for logging only.

use crate::config::{Config, NEWS_COUNTRY, WEATHER_UNITS};
use crate::error::AppError;
use serde_json::Value;

/// Client for OpenWeatherMap and NewsAPI.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    weather_url: String,
    weather_api_key: String,
    news_url: String,
    news_api_key: String,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            weather_url: config.endpoints.weather_url.clone(),
            weather_api_key: config.weather_api_key.clone(),
            news_url: config.endpoints.news_url.clone(),
            news_api_key: config.news_api_key.clone(),
        }
    }

    /// Current weather for `city`.
    pub async fn weather(&self, city: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(&self.weather_url)
            .query(&[
                ("q", city),
                ("appid", self.weather_api_key.as_str()),
                ("units", WEATHER_UNITS),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Weather request failed: {}", e)))?;

        check_response_json(response).await
    }

    /// Top headlines for `category`.
    pub async fn news(&self, category: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(&self.news_url)
            .query(&[
                ("country", NEWS_COUNTRY),
                ("category", category),
                ("apiKey", self.news_api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("News request failed: {}", e)))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            tracing::warn!("Upstream rate limit hit (429)");
        }
        return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
}
