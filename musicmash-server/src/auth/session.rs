//! Server-side sessions
//!
//! A session is created when the login handshake succeeds and is found again
//! through the `musicmash_session` cookie. Its token record sits behind its
//! own mutex: concurrent requests on one session take turns, so an expired
//! token is refreshed once and a refresh token is never spent twice.

use super::token::{TokenRecord, TokenRefresher};
use crate::spotify::TrackFeed;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "musicmash_session";

/// Session lifetime in the browser; the token itself may expire sooner
const COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// One signed-in user
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    token: Mutex<TokenRecord>,
    /// Tracks from this session's latest top-tracks fetch
    pub feed: TrackFeed,
}

impl Session {
    fn new(record: TokenRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            token: Mutex::new(record),
            feed: TrackFeed::new(),
        }
    }

    /// Token record as of `now`, refreshed first if it has expired
    ///
    /// The refreshed (or error-tagged) record replaces the stored one.
    pub async fn current_token(&self, refresher: &TokenRefresher, now: DateTime<Utc>) -> TokenRecord {
        let mut token = self.token.lock().await;
        let refreshed = refresher.refresh_if_expired(token.clone(), now).await;
        *token = refreshed.clone();
        refreshed
    }
}

/// All live sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, record: TokenRecord) -> Arc<Session> {
        self.create_at(record, Utc::now()).await
    }

    /// Create a session as of `now`, dropping sessions whose cookie has expired
    pub async fn create_at(&self, record: TokenRecord, now: DateTime<Utc>) -> Arc<Session> {
        let session = Arc::new(Session::new(record, now));
        let max_age = ChronoDuration::seconds(COOKIE_MAX_AGE_SECS);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| now - existing.created_at < max_age);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned = pruned, "Pruned expired sessions");
        }
        sessions.insert(session.id, Arc::clone(&session));
        drop(sessions);

        info!(session_id = %session.id, "Session created");
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Session id from the request's `Cookie` headers
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value establishing the session
pub fn session_cookie(id: &Uuid) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, id, COOKIE_MAX_AGE_SECS
    )
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// The caller's session, if the cookie names a live one
pub struct MaybeSession(pub Option<Arc<Session>>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = match session_id_from_headers(&parts.headers) {
            Some(id) => state.sessions.get(&id).await,
            None => None,
        };
        Ok(MaybeSession(session))
    }
}
