//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.medchat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MedchatConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    pub create_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub resync_delay_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CREATE_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_RESYNC_DELAY_MS: u64 = 2000;

/// Environment variable selecting the backend endpoint.
pub const API_URL_ENV: &str = "MEDCHAT_API_URL";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub create_attempts: u32,
    pub retry_base_delay: Duration,
    pub resync_delay: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&MedchatConfig::default(), None, None)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.medchat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".medchat").join("config.toml"))
}

/// Load config from `~/.medchat/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `MedchatConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<MedchatConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(MedchatConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(MedchatConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: MedchatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# medchat configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# api_url = "http://localhost:8000"   # Or set MEDCHAT_API_URL
# request_timeout_secs = 60

# [session]
# create_attempts = 3                 # Session creation attempts before giving up
# retry_base_delay_ms = 1000          # Backoff grows linearly: 1x, 2x, ...
# resync_delay_ms = 2000              # Wait before re-reading messages after an upload
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `env_api_url` is the value of `MEDCHAT_API_URL` (passed in so resolution
/// stays pure); `cli_api_url` comes from `--api-url`.
pub fn resolve(
    config: &MedchatConfig,
    env_api_url: Option<&str>,
    cli_api_url: Option<&str>,
) -> ResolvedConfig {
    let api_url = cli_api_url
        .or(env_api_url)
        .map(|s| s.to_string())
        .or_else(|| config.backend.api_url.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let create_attempts = config
        .session
        .create_attempts
        .unwrap_or(DEFAULT_CREATE_ATTEMPTS)
        .max(1);

    ResolvedConfig {
        api_url: api_url.trim_end_matches('/').to_string(),
        request_timeout: Duration::from_secs(
            config
                .backend
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        create_attempts,
        retry_base_delay: Duration::from_millis(
            config
                .session
                .retry_base_delay_ms
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        ),
        resync_delay: Duration::from_millis(
            config
                .session
                .resync_delay_ms
                .unwrap_or(DEFAULT_RESYNC_DELAY_MS),
        ),
    }
}

/// Load the config file (falling back to defaults on error) and resolve it
/// against the process environment and CLI.
pub fn load_and_resolve(cli_api_url: Option<&str>) -> ResolvedConfig {
    let config = load_config().unwrap_or_else(|e| {
        warn!("{}; using defaults", e);
        MedchatConfig::default()
    });
    let env_api_url = std::env::var(API_URL_ENV).ok();
    resolve(&config, env_api_url.as_deref(), cli_api_url)
}
