//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MUSICMASH_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "musicmash.db";

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// `[spotify]` section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
}

/// `[workflow]` section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    pub workspace: Option<String>,
    pub save_delay_ms: Option<u64>,
    pub placement: Option<String>,
}

/// Contents of `config.toml`
///
/// Every field is optional: a missing or partial file degrades to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file, or defaults if it is missing or broken
    ///
    /// A missing file is normal (info); a broken one is logged as a warning.
    /// Neither stops startup.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Default config file location: `<config_dir>/musicmash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("musicmash").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("musicmash"))
        .unwrap_or_else(|| PathBuf::from("./musicmash_data"))
}

/// Resolve one string setting: CLI → environment → TOML → default
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
    default: &str,
) -> String {
    if let Some(value) = cli_arg {
        return value.to_string();
    }
    if let Some(value) = non_blank_env(env_var_name) {
        return value;
    }
    if let Some(value) = toml_value.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    default.to_string()
}

/// Resolve a setting that has no default; absence is a configuration error
pub fn require_setting(
    env_var_name: &str,
    toml_value: Option<&str>,
    description: &str,
) -> Result<String> {
    if let Some(value) = non_blank_env(env_var_name) {
        return Ok(value);
    }
    if let Some(value) = toml_value.filter(|v| !v.trim().is_empty()) {
        return Ok(value.to_string());
    }
    Err(Error::Config(format!(
        "{} not configured. Set {} or add it to the [spotify] section of config.toml",
        description, env_var_name
    )))
}

/// Resolve the root folder: CLI → `MUSICMASH_ROOT_FOLDER` → TOML → default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = non_blank_env(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }
    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder: {}", root_folder.display());
    }
    Ok(root_folder.join(DATABASE_FILE))
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
