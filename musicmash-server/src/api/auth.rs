//! Sign-in, sign-out and session status

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::oauth::authorize_url;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{MaybeSession, TokenErrorTag};
use crate::{ApiError, ApiResult, AppState};

/// GET /auth/login
///
/// Redirects to the provider's consent page.
pub async fn login(State(state): State<AppState>) -> ApiResult<Redirect> {
    let login_state = state.pending_logins.issue(Utc::now()).await;
    let url = authorize_url(
        &state.config.authorize_url,
        &state.config.credentials.client_id,
        &state.config.redirect_uri,
        &login_state,
    )
    .map_err(|e| ApiError::Internal(format!("Invalid authorize URL: {}", e)))?;

    Ok(Redirect::to(url.as_str()))
}

/// Query parameters the provider sends back
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/callback
///
/// Exchanges the authorization code, creates the session and sets its
/// cookie, then sends the browser home.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    if let Some(error) = params.error {
        warn!("Provider declined sign-in: {}", error);
        return Err(ApiError::BadRequest(format!("Sign-in failed: {}", error)));
    }

    let (Some(code), Some(login_state)) = (params.code, params.state) else {
        return Err(ApiError::BadRequest("Missing code or state".to_string()));
    };

    let now = Utc::now();
    if !state.pending_logins.consume(&login_state, now).await {
        return Err(ApiError::BadRequest("Unknown or expired login state".to_string()));
    }

    let record = state
        .refresher
        .exchange_code(&code, &state.config.redirect_uri, now)
        .await
        .map_err(|e| {
            warn!("Authorization code exchange failed: {}", e);
            ApiError::TokenError
        })?;

    let session = state.sessions.create(record).await;
    info!(session_id = %session.id, "Signed in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.id))],
        Redirect::to("/"),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    let signed_out = match session {
        Some(session) => state.sessions.remove(&session.id).await,
        None => false,
    };

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(LogoutResponse { signed_out }),
    )
        .into_response()
}

/// Client view of the session; the tokens themselves never leave the server
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TokenErrorTag>,
}

/// GET /api/session
///
/// Refreshes the token first if it has expired, like any other read.
pub async fn session_status(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Json<SessionStatus> {
    let Some(session) = session else {
        return Json(SessionStatus {
            authenticated: false,
            expires_at: None,
            error: None,
        });
    };

    let token = session.current_token(&state.refresher, Utc::now()).await;
    Json(SessionStatus {
        authenticated: token.error.is_none(),
        expires_at: Some(token.expires_at),
        error: token.error,
    })
}
