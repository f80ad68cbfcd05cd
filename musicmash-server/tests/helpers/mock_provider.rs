//! Local stand-in for the Spotify accounts and Web API hosts
//!
//! Serves `POST /api/token` and `GET /v1/me/top/tracks` on an ephemeral
//! port. Failures are switched on per test through [`MockState`].

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Nothing listens here; requests fail at the transport level
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

pub const CODE_ACCESS_TOKEN: &str = "access-from-code";
pub const CODE_REFRESH_TOKEN: &str = "refresh-from-code";
pub const REFRESHED_ACCESS_TOKEN: &str = "refreshed-access";
pub const ROTATED_REFRESH_TOKEN: &str = "refresh-2";

/// Switches and counters shared with the running mock
#[derive(Default)]
pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
    pub top_tracks_calls: AtomicUsize,
    /// Refresh grants answer 400 `invalid_grant`
    pub refresh_fails: AtomicBool,
    /// Refresh grants also return a new refresh token
    pub rotate_refresh: AtomicBool,
    /// Non-zero: top-tracks answers with this status
    pub top_tracks_status: AtomicU16,
    pub last_bearer: Mutex<Option<String>>,
    pub last_basic_auth: Mutex<Option<String>>,
}

pub struct MockProvider {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/me/top/tracks", get(top_tracks))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind mock provider");
        let addr = listener.local_addr().expect("Should have local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock provider failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn top_tracks_calls(&self) -> usize {
        self.state.top_tracks_calls.load(Ordering::SeqCst)
    }

    pub fn fail_refresh(&self) {
        self.state.refresh_fails.store(true, Ordering::SeqCst);
    }

    pub fn rotate_refresh_token(&self) {
        self.state.rotate_refresh.store(true, Ordering::SeqCst);
    }

    pub fn fail_top_tracks_with(&self, status: u16) {
        self.state.top_tracks_status.store(status, Ordering::SeqCst);
    }

    pub fn last_bearer(&self) -> Option<String> {
        self.state.last_bearer.lock().unwrap().clone()
    }

    pub fn last_basic_auth(&self) -> Option<String> {
        self.state.last_basic_auth.lock().unwrap().clone()
    }
}

/// Two tracks plus the paging fields the real API sends
pub fn top_tracks_payload() -> Value {
    json!({
        "href": "https://api.spotify.com/v1/me/top/tracks",
        "limit": 20,
        "offset": 0,
        "total": 2,
        "items": [
            {
                "id": "T1",
                "name": "First Song",
                "popularity": 71,
                "artists": [{ "name": "Alpha" }, { "name": "Beta" }],
                "album": {
                    "name": "First Album",
                    "images": [{ "url": "https://i.scdn.co/image/t1", "height": 640, "width": 640 }]
                },
                "external_urls": { "spotify": "https://open.spotify.com/track/T1" }
            },
            {
                "id": "T2",
                "name": "Second Song",
                "artists": [{ "name": "Gamma" }],
                "album": { "name": "Second Album", "images": [] },
                "external_urls": { "spotify": "https://open.spotify.com/track/T2" }
            }
        ]
    })
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    *state.last_basic_auth.lock().unwrap() = header_value(&headers, header::AUTHORIZATION);

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            state.code_calls.fetch_add(1, Ordering::SeqCst);
            Json(json!({
                "access_token": CODE_ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": CODE_REFRESH_TOKEN,
                "scope": "user-read-email user-top-read"
            }))
            .into_response()
        }
        Some("refresh_token") => {
            state.refresh_calls.fetch_add(1, Ordering::SeqCst);
            // Long enough for concurrent callers to pile up behind the first
            tokio::time::sleep(Duration::from_millis(50)).await;
            if state.refresh_fails.load(Ordering::SeqCst) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant" })),
                )
                    .into_response();
            }
            let mut grant = json!({
                "access_token": REFRESHED_ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            });
            if state.rotate_refresh.load(Ordering::SeqCst) {
                grant["refresh_token"] = json!(ROTATED_REFRESH_TOKEN);
            }
            Json(grant).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response(),
    }
}

async fn top_tracks(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.top_tracks_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_bearer.lock().unwrap() = header_value(&headers, header::AUTHORIZATION);

    let status = state.top_tracks_status.load(Ordering::SeqCst);
    if status != 0 {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (
            code,
            Json(json!({ "error": { "status": status, "message": "Mock failure" } })),
        )
            .into_response();
    }

    Json(top_tracks_payload()).into_response()
}
