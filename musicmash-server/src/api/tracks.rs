//! Top-tracks proxy

use axum::{extract::State, Json};
use chrono::Utc;
use musicmash_common::events::MusicMashEvent;
use serde_json::Value;
use tracing::{debug, error};

use crate::auth::{MaybeSession, TokenState};
use crate::spotify::{parse_items, FetchError};
use crate::{ApiError, ApiResult, AppState};

/// GET /api/spotify/top-tracks
///
/// Returns the provider payload unchanged. Errors:
/// - 401 `Not authenticated`: no session
/// - 401 `Token error`: the session's token is errored, including a refresh
///   that just failed
/// - provider status mirrored: the provider rejected the request
/// - 500: the provider could not be reached
pub async fn top_tracks(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> ApiResult<Json<Value>> {
    let session = session.ok_or(ApiError::NotAuthenticated)?;

    let now = Utc::now();
    let token = session.current_token(&state.refresher, now).await;
    let access_token = match token.state_at(now) {
        TokenState::Valid(access_token) => access_token.to_string(),
        TokenState::Errored(_) | TokenState::Expired => return Err(ApiError::TokenError),
    };

    let ticket = session.feed.ticket();
    let payload = state
        .spotify
        .top_tracks(&access_token)
        .await
        .map_err(|e| match e {
            FetchError::Upstream { status, .. } => ApiError::Upstream { status },
            FetchError::Transport(message) => {
                error!("Error fetching top tracks: {}", message);
                ApiError::Transport
            }
        })?;

    let tracks = parse_items(&payload);
    let count = tracks.len();
    if session.feed.apply(ticket, tracks).await {
        state.event_bus.emit_lossy(MusicMashEvent::TracksLoaded {
            count,
            sequence: ticket,
            timestamp: Utc::now(),
        });
    } else {
        let applied = session.feed.applied_sequence().await;
        debug!(
            ticket = ticket,
            applied = applied,
            "Newer top-tracks list already applied"
        );
    }

    Ok(Json(payload))
}
