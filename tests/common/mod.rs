// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

pub mod mock_server;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use daybrief::config::Config;
use daybrief::db::{FirestoreDb, MemoryStore, Stores};
use daybrief::routes::create_router;
use daybrief::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub use mock_server::MockServer;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Everything a test needs to drive the app and inspect its effects.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub mock: MockServer,
}

/// Test config with every remote endpoint pointed at `mock`.
#[allow(dead_code)]
pub fn test_config(mock: &MockServer) -> Config {
    let mut config = Config::test_default();
    let base = &mock.base_url;
    config.endpoints.google_auth_url = format!("{}/google/authorize", base);
    config.endpoints.google_token_url = format!("{}/google/token", base);
    config.endpoints.google_userinfo_url = format!("{}/google/userinfo", base);
    config.endpoints.github_auth_url = format!("{}/github/authorize", base);
    config.endpoints.github_token_url = format!("{}/github/token", base);
    config.endpoints.github_api_url = format!("{}/github/api", base);
    config.endpoints.weather_url = format!("{}/weather", base);
    config.endpoints.news_url = format!("{}/news", base);
    config
}

/// Create a test app over memory stores and a fresh mock server.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let mock = MockServer::start().await;
    let config = test_config(&mock);
    create_test_app_with_config(config, mock)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config, mock: MockServer) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let stores = Stores {
        users: store.clone(),
        sessions: store.clone(),
    };
    let state = Arc::new(AppState::new(config, stores).expect("Failed to build state"));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        mock,
    }
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Value part of a `Set-Cookie` header.
#[allow(dead_code)]
pub fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, v)| v.to_string())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// GET `uri`, optionally with a session cookie.
#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, session: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = session {
        request = request.header(header::COOKIE, format!("daybrief_session={token}"));
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Start a login at `/auth/{provider}`. Returns (state, nonce).
#[allow(dead_code)]
pub async fn start_login(app: &Router, provider: &str) -> (String, String) {
    let response = get(app, &format!("/auth/{provider}"), None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let nonce = cookie_value(&find_cookie(
        &set_cookie_headers(&response),
        "daybrief_oauth_nonce",
    ));
    let location = location(&response);
    let state = location
        .split_once("state=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .expect("authorize URL without state");
    let state = urlencoding::decode(state).unwrap().into_owned();

    (state, nonce)
}

/// Call the provider callback with `code`, `state` and the nonce cookie.
#[allow(dead_code)]
pub async fn callback(
    app: &Router,
    provider: &str,
    code: &str,
    state: &str,
    nonce: Option<&str>,
) -> Response {
    let mut request = Request::builder().uri(format!(
        "/auth/{provider}/callback?code={}&state={}",
        urlencoding::encode(code),
        urlencoding::encode(state)
    ));
    if let Some(nonce) = nonce {
        request = request.header(header::COOKIE, format!("daybrief_oauth_nonce={nonce}"));
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Run the full OAuth flow against the mock provider. Returns the session token.
#[allow(dead_code)]
pub async fn login(app: &Router, provider: &str, code: &str) -> String {
    let (state, nonce) = start_login(app, provider).await;
    let response = callback(app, provider, code, &state, Some(&nonce)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    cookie_value(&find_cookie(
        &set_cookie_headers(&response),
        "daybrief_session",
    ))
}
