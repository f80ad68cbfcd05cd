//! Access/refresh token records and the refresh exchange

use crate::config::ClientCredentials;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a token record was invalidated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenErrorTag {
    RefreshAccessTokenError,
}

/// A session's token pair and validity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub error: Option<TokenErrorTag>,
}

/// What a record is good for at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState<'a> {
    Valid(&'a str),
    Expired,
    Errored(TokenErrorTag),
}

impl TokenRecord {
    /// Record for a fresh grant issued at `issued_at`
    pub fn from_grant(grant: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: issued_at + ChronoDuration::seconds(grant.expires_in),
            error: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// An errored record is never valid, even before expiry
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState<'_> {
        if let Some(tag) = self.error {
            TokenState::Errored(tag)
        } else if self.is_expired_at(now) {
            TokenState::Expired
        } else {
            TokenState::Valid(&self.access_token)
        }
    }

    fn with_error(mut self, tag: TokenErrorTag) -> Self {
        self.error = Some(tag);
        self
    }
}

/// Token endpoint success body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token endpoint failures
#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No refresh token available")]
    NoRefreshToken,
}

/// Talks to the identity provider's token endpoint
///
/// Holds everything a refresh needs, so callers pass it explicitly instead
/// of reaching for process-wide state.
pub struct TokenRefresher {
    http: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
}

impl TokenRefresher {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>, credentials: ClientCredentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }

    /// Return `record` untouched while it is valid, otherwise refresh it
    ///
    /// Never fails: an unsuccessful refresh returns the original record with
    /// the error tag set and the old access token kept. Errored records are
    /// returned as they are; the user has to sign in again.
    pub async fn refresh_if_expired(&self, record: TokenRecord, now: DateTime<Utc>) -> TokenRecord {
        match record.state_at(now) {
            TokenState::Valid(_) | TokenState::Errored(_) => return record,
            TokenState::Expired => {}
        }

        debug!(expired_at = %record.expires_at, "Access token expired, refreshing");

        match self.refresh(&record).await {
            Ok(grant) => {
                let rotated = grant.refresh_token.is_some();
                let refreshed = TokenRecord {
                    refresh_token: grant.refresh_token.or(record.refresh_token),
                    access_token: grant.access_token,
                    expires_at: now + ChronoDuration::seconds(grant.expires_in),
                    error: None,
                };
                info!(
                    expires_at = %refreshed.expires_at,
                    rotated_refresh_token = rotated,
                    "Access token refreshed"
                );
                refreshed
            }
            Err(e) => {
                warn!("Access token refresh failed: {}", e);
                record.with_error(TokenErrorTag::RefreshAccessTokenError)
            }
        }
    }

    /// Exchange an authorization code from the login redirect
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenRecord, TokenExchangeError> {
        let grant = self
            .request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .await?;
        Ok(TokenRecord::from_grant(grant, now))
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenResponse, TokenExchangeError> {
        let refresh_token = record
            .refresh_token
            .as_deref()
            .ok_or(TokenExchangeError::NoRefreshToken)?;

        self.request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, TokenExchangeError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| TokenExchangeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TokenExchangeError::Parse(e.to_string()))
    }
}
