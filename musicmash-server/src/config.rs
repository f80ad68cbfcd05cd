//! Service configuration
//!
//! Combines CLI overrides, environment variables and `config.toml` into one
//! resolved [`ServiceConfig`]. Spotify client credentials are required;
//! everything else has a default.

use crate::workflow::Placement;
use musicmash_common::config::{
    require_setting, resolve_root_folder, resolve_setting, TomlConfig,
};
use musicmash_common::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5730/auth/callback";
pub const DEFAULT_WORKSPACE: &str = "musicmash-workflow";
pub const DEFAULT_SAVE_DELAY_MS: u64 = 1000;
pub const DEFAULT_PLACEMENT: &str = "ring";

pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";
pub const AUTHORIZE_URL_ENV: &str = "MUSICMASH_AUTHORIZE_URL";
pub const TOKEN_URL_ENV: &str = "MUSICMASH_TOKEN_URL";
pub const API_BASE_URL_ENV: &str = "MUSICMASH_API_BASE_URL";
pub const WORKSPACE_ENV: &str = "MUSICMASH_WORKSPACE";
pub const SAVE_DELAY_ENV: &str = "MUSICMASH_SAVE_DELAY_MS";
pub const PLACEMENT_ENV: &str = "MUSICMASH_PLACEMENT";

/// Identity provider client id/secret pair
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Keep the secret out of logs
impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub log_level: String,
    pub root_folder: PathBuf,
    pub credentials: ClientCredentials,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub workspace: String,
    pub save_delay: Duration,
    pub placement: Placement,
}

impl ServiceConfig {
    /// Defaults for everything except the credentials
    pub fn with_credentials(credentials: ClientCredentials) -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            root_folder: musicmash_common::config::default_root_folder(),
            credentials,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            workspace: DEFAULT_WORKSPACE.to_string(),
            save_delay: Duration::from_millis(DEFAULT_SAVE_DELAY_MS),
            placement: Placement::default(),
        }
    }

    /// Resolve every setting: CLI → environment → TOML → default
    ///
    /// Fails with [`Error::Config`] when the client credentials are missing
    /// or the placement name is unknown.
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let spotify = &toml.spotify;
        let credentials = ClientCredentials {
            client_id: require_setting(
                CLIENT_ID_ENV,
                spotify.client_id.as_deref(),
                "Spotify client id",
            )?,
            client_secret: require_setting(
                CLIENT_SECRET_ENV,
                spotify.client_secret.as_deref(),
                "Spotify client secret",
            )?,
        };

        let workflow = &toml.workflow;
        let placement = resolve_setting(
            None,
            PLACEMENT_ENV,
            workflow.placement.as_deref(),
            DEFAULT_PLACEMENT,
        )
        .parse::<Placement>()
        .map_err(|e| Error::Config(e.to_string()))?;

        let toml_delay = workflow.save_delay_ms.map(|ms| ms.to_string());
        let save_delay_ms = resolve_setting(
            None,
            SAVE_DELAY_ENV,
            toml_delay.as_deref(),
            &DEFAULT_SAVE_DELAY_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| Error::Config(format!("Invalid save delay: {}", e)))?;

        Ok(Self {
            bind_address: resolve_setting(
                cli.bind.as_deref(),
                "MUSICMASH_BIND",
                toml.bind_address.as_deref(),
                DEFAULT_BIND_ADDRESS,
            ),
            log_level: resolve_setting(
                cli.log_level.as_deref(),
                "MUSICMASH_LOG",
                toml.logging.level.as_deref(),
                DEFAULT_LOG_LEVEL,
            ),
            root_folder: resolve_root_folder(cli.root_folder.as_deref(), toml),
            credentials,
            redirect_uri: resolve_setting(
                None,
                "MUSICMASH_REDIRECT_URI",
                spotify.redirect_uri.as_deref(),
                DEFAULT_REDIRECT_URI,
            ),
            authorize_url: resolve_setting(
                None,
                AUTHORIZE_URL_ENV,
                spotify.authorize_url.as_deref(),
                DEFAULT_AUTHORIZE_URL,
            ),
            token_url: resolve_setting(
                None,
                TOKEN_URL_ENV,
                spotify.token_url.as_deref(),
                DEFAULT_TOKEN_URL,
            ),
            api_base_url: resolve_setting(
                None,
                API_BASE_URL_ENV,
                spotify.api_base_url.as_deref(),
                DEFAULT_API_BASE_URL,
            ),
            workspace: resolve_setting(
                None,
                WORKSPACE_ENV,
                workflow.workspace.as_deref(),
                DEFAULT_WORKSPACE,
            ),
            save_delay: Duration::from_millis(save_delay_ms),
            placement,
        })
    }
}
