//! Spotify Web API client
//!
//! One call: the signed-in user's top tracks. No retries; a failure is
//! reported once to the caller.

use musicmash_common::model::Track;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const USER_AGENT: &str = concat!("MusicMash/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-tracks fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// Provider answered with a non-2xx status
    #[error("Provider returned {status}")]
    Upstream { status: u16, body: String },

    /// Network failure or unreadable body
    #[error("Network error: {0}")]
    Transport(String),
}

/// Shared HTTP client for provider calls
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Spotify Web API client
pub struct SpotifyClient {
    http: reqwest::Client,
    api_base_url: String,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// GET `/me/top/tracks` with the session's bearer token
    ///
    /// Returns the provider payload exactly as received.
    pub async fn top_tracks(&self, access_token: &str) -> Result<Value, FetchError> {
        let url = format!("{}/me/top/tracks", self.api_base_url);
        debug!(url = %url, "Fetching top tracks");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Top tracks request rejected");
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        info!(
            items = payload["items"].as_array().map(|a| a.len()).unwrap_or(0),
            "Top tracks fetched"
        );
        Ok(payload)
    }
}

/// Tracks in a top-tracks payload's `items`
///
/// Items that do not look like a track are skipped.
pub fn parse_items(payload: &Value) -> Vec<Track> {
    let Some(items) = payload.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Track>(item.clone()) {
            Ok(track) => Some(track),
            Err(e) => {
                debug!("Skipping unrecognized top-tracks item: {}", e);
                None
            }
        })
        .collect()
}
