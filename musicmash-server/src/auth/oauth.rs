//! Authorization-code login handshake
//!
//! `/auth/login` sends the browser to the provider with a one-time `state`;
//! `/auth/callback` only accepts that state back within
//! [`LOGIN_STATE_TTL_MINUTES`].

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

/// Scopes requested at login
pub const SCOPES: [&str; 4] = [
    "user-read-email",
    "user-read-private",
    "user-top-read",
    "user-read-recently-played",
];

/// How long a login attempt may take before its state is rejected
pub const LOGIN_STATE_TTL_MINUTES: i64 = 10;

fn login_state_ttl() -> ChronoDuration {
    ChronoDuration::minutes(LOGIN_STATE_TTL_MINUTES)
}

/// Scope parameter value: the scopes joined by spaces
pub fn scope_string() -> String {
    SCOPES.join(" ")
}

/// Provider authorization URL for one login attempt
pub fn authorize_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", scope_string().as_str()),
            ("state", state),
        ],
    )
}

/// Outstanding login states and when they were issued
#[derive(Clone, Default)]
pub struct PendingLogins {
    states: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl PendingLogins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh state value, dropping any that have gone stale
    pub async fn issue(&self, now: DateTime<Utc>) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let mut states = self.states.lock().await;
        states.retain(|_, issued| now - *issued < login_state_ttl());
        states.insert(state.clone(), now);
        state
    }

    /// Consume `state`; true only the first time and only while fresh
    pub async fn consume(&self, state: &str, now: DateTime<Utc>) -> bool {
        match self.states.lock().await.remove(state) {
            Some(issued) => now - issued < login_state_ttl(),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }
}
