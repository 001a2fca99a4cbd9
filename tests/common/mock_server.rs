// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the OAuth providers and the weather/news APIs.
//!
//! Bound to `127.0.0.1:0` and served on the test's own runtime, so every
//! test gets an isolated instance.

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Code the mock token endpoints reject.
#[allow(dead_code)]
pub const BAD_CODE: &str = "bad-code";

/// City the mock weather API does not know.
#[allow(dead_code)]
pub const UNKNOWN_CITY: &str = "Atlantis";

/// Category the mock news API fails on.
#[allow(dead_code)]
pub const BROKEN_CATEGORY: &str = "broken";

/// Shared state for the mock server
#[derive(Clone)]
pub struct MockState {
    pub google_profile: Arc<Mutex<Value>>,
    pub github_user: Arc<Mutex<Value>>,
    pub github_emails: Arc<Mutex<Value>>,
    /// Query string of the last weather request
    pub last_weather_query: Arc<Mutex<Option<HashMap<String, String>>>>,
    /// Query string of the last news request
    pub last_news_query: Arc<Mutex<Option<HashMap<String, String>>>>,
    /// Form body of the last token request
    pub last_token_form: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            google_profile: Arc::new(Mutex::new(json!({
                "sub": "google-123",
                "email": "ada@example.com",
                "name": "Ada Lovelace",
                "picture": "https://lh3.googleusercontent.com/ada.png"
            }))),
            github_user: Arc::new(Mutex::new(json!({
                "id": 583231,
                "login": "octocat",
                "name": "The Octocat",
                "email": "octocat@github.com",
                "avatar_url": "https://avatars.githubusercontent.com/u/583231"
            }))),
            github_emails: Arc::new(Mutex::new(json!([]))),
            last_weather_query: Arc::new(Mutex::new(None)),
            last_news_query: Arc::new(Mutex::new(None)),
            last_token_form: Arc::new(Mutex::new(None)),
        }
    }
}

/// A running mock server.
#[derive(Clone)]
pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/google/token", post(token))
            .route("/google/userinfo", get(google_userinfo))
            .route("/github/token", post(github_token))
            .route("/github/api/user", get(github_user))
            .route("/github/api/user/emails", get(github_emails))
            .route("/weather", get(weather))
            .route("/news", get(news))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    #[allow(dead_code)]
    pub fn set_google_profile(&self, profile: Value) {
        *self.state.google_profile.lock().unwrap() = profile;
    }

    #[allow(dead_code)]
    pub fn set_github_user(&self, user: Value) {
        *self.state.github_user.lock().unwrap() = user;
    }

    #[allow(dead_code)]
    pub fn set_github_emails(&self, emails: Value) {
        *self.state.github_emails.lock().unwrap() = emails;
    }

    #[allow(dead_code)]
    pub fn last_weather_query(&self) -> Option<HashMap<String, String>> {
        self.state.last_weather_query.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn last_news_query(&self) -> Option<HashMap<String, String>> {
        self.state.last_news_query.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn last_token_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_token_form.lock().unwrap().clone()
    }
}

/// Canned weather response for `city`.
#[allow(dead_code)]
pub fn weather_json(city: &str) -> Value {
    json!({
        "name": city,
        "sys": { "country": "GB", "sunrise": 1_700_000_000, "sunset": 1_700_030_000 },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "main": {
            "temp": 11.6, "feels_like": 10.2, "temp_min": 9.4,
            "temp_max": 13.1, "humidity": 81, "pressure": 1012
        },
        "wind": { "speed": 4.1, "deg": 240 },
        "visibility": 10000,
        "clouds": { "all": 75 },
        "timezone": 0,
        "cod": 200
    })
}

/// Canned news response for `category`.
#[allow(dead_code)]
pub fn news_json(category: &str) -> Value {
    json!({
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": { "id": null, "name": "Example News" },
                "title": format!("Top {category} story"),
                "description": "Something happened.",
                "url": "https://news.example.com/1",
                "urlToImage": null,
                "publishedAt": "2026-10-15T08:00:00Z"
            },
            {
                "source": { "id": null, "name": "Example News" },
                "title": "[Removed]",
                "description": null,
                "url": "https://removed.com"
            }
        ]
    })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn token(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let code = form.get("code").cloned().unwrap_or_default();
    *state.last_token_form.lock().unwrap() = Some(form);

    if code == BAD_CODE {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }
    Json(json!({ "access_token": format!("access-{code}"), "token_type": "Bearer" })).into_response()
}

/// GitHub answers 200 even for a bad code.
async fn github_token(
    State(state): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.contains("application/json"));
    if !wants_json {
        return (StatusCode::OK, "access_token=form-encoded&token_type=bearer").into_response();
    }

    let code = form.get("code").cloned().unwrap_or_default();
    *state.last_token_form.lock().unwrap() = Some(form);

    if code == BAD_CODE {
        return Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }))
        .into_response();
    }
    Json(json!({ "access_token": format!("gh-{code}"), "token_type": "bearer", "scope": "user:email" }))
        .into_response()
}

async fn google_userinfo(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.google_profile.lock().unwrap().clone()).into_response()
}

async fn github_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() || !headers.contains_key(header::USER_AGENT) {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(state.github_user.lock().unwrap().clone()).into_response()
}

async fn github_emails(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.github_emails.lock().unwrap().clone()).into_response()
}

async fn weather(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let city = query.get("q").cloned().unwrap_or_default();
    *state.last_weather_query.lock().unwrap() = Some(query);

    if city == UNKNOWN_CITY {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "cod": "404", "message": "city not found" })),
        )
            .into_response();
    }
    Json(weather_json(&city)).into_response()
}

async fn news(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let category = query.get("category").cloned().unwrap_or_default();
    *state.last_news_query.lock().unwrap() = Some(query);

    if category == BROKEN_CATEGORY {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    Json(news_json(&category)).into_response()
}
