//! musicmash-server router wired to a mock provider
//!
//! Each `TestApp` gets its own in-memory database, so tests never share
//! workflow state.

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use musicmash_common::db::init_memory_database;
use musicmash_common::events::EventBus;
use musicmash_server::auth::{TokenErrorTag, TokenRecord};
use musicmash_server::config::ClientCredentials;
use musicmash_server::{build_router, AppState, ServiceConfig};
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use tower::util::ServiceExt;

use super::MockProvider;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: AppState,
    pub db: SqlitePool,
}

impl TestApp {
    /// Fresh database, provider URLs pointed at `mock`
    pub async fn start(mock: &MockProvider) -> Self {
        let db = init_memory_database()
            .await
            .expect("Should create in-memory database");
        Self::with_pool(db, mock.token_url(), mock.api_base_url()).await
    }

    /// Same as [`TestApp::start`] with explicit provider URLs
    pub async fn with_urls(token_url: String, api_base_url: String) -> Self {
        let db = init_memory_database()
            .await
            .expect("Should create in-memory database");
        Self::with_pool(db, token_url, api_base_url).await
    }

    /// Over an existing database, e.g. to simulate a restart
    pub async fn with_pool(db: SqlitePool, token_url: String, api_base_url: String) -> Self {
        let mut config =
            ServiceConfig::with_credentials(ClientCredentials::new(CLIENT_ID, CLIENT_SECRET));
        config.token_url = token_url;
        config.api_base_url = api_base_url;
        config.authorize_url = "https://accounts.example.test/authorize".to_string();
        config.save_delay = Duration::from_millis(1000);

        let state = AppState::build(config, db.clone(), EventBus::new(100))
            .await
            .expect("Should build app state");
        Self { state, db }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Session with the given token record; returns its `Cookie` header value
    pub async fn session_with(&self, record: TokenRecord) -> String {
        let session = self.state.sessions.create(record).await;
        format!("musicmash_session={}", session.id)
    }

    /// Stored token record of the session behind `cookie`
    ///
    /// Only meaningful while that record is unexpired, since reading an
    /// expired one refreshes it.
    pub async fn stored_token(&self, cookie: &str) -> TokenRecord {
        let id = cookie
            .strip_prefix("musicmash_session=")
            .and_then(|id| uuid::Uuid::parse_str(id).ok())
            .expect("Should be a session cookie");
        let session = self.state.sessions.get(&id).await.expect("Should be a live session");
        session.current_token(&self.state.refresher, Utc::now()).await
    }

    pub async fn valid_session(&self) -> String {
        self.session_with(token_record("live-access", 3600, None)).await
    }

    pub async fn expired_session(&self) -> String {
        self.session_with(token_record("stale-access", -60, None)).await
    }

    pub async fn errored_session(&self) -> String {
        self.session_with(token_record(
            "stale-access",
            3600,
            Some(TokenErrorTag::RefreshAccessTokenError),
        ))
        .await
    }
}

/// Record expiring `expires_in_secs` from now (negative: already expired)
pub fn token_record(
    access_token: &str,
    expires_in_secs: i64,
    error: Option<TokenErrorTag>,
) -> TokenRecord {
    TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Utc::now() + ChronoDuration::seconds(expires_in_secs),
        error,
    }
}

pub async fn extract_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn extract_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}
