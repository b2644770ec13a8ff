use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::follow_up::FollowUpPolicy;
use crate::risk::RiskThresholds;

/// Application-level constants
pub const APP_NAME: &str = "CommunityHealth";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 30;
/// One year.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 525_600;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

const ENV_DB_PATH: &str = "CHT_DB_PATH";
const ENV_BIND_ADDR: &str = "CHT_BIND_ADDR";
const ENV_TOKEN_TTL: &str = "CHT_TOKEN_TTL_MINUTES";
const ENV_PBKDF2_ITERATIONS: &str = "CHT_PBKDF2_ITERATIONS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Cannot determine a data directory; set CHT_DB_PATH")]
    NoDataDir,
}

/// Default log filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,community_health_lib=debug,tower_http=info"
}

/// Get the application data directory.
/// ~/CommunityHealth/ on all platforms.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default database location inside the data directory.
pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("community_health.db"))
}

/// Access-token and password-hashing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_minutes: u64,
    pub pbkdf2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Everything the service needs at construction time.
///
/// Nothing here is read from process-wide statics after startup: the
/// config is built once and handed to `CoreState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub risk: RiskThresholds,
    #[serde(default)]
    pub follow_up: FollowUpPolicy,
}

impl AppConfig {
    /// Config with defaults for everything except the database path.
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            auth: AuthConfig::default(),
            risk: RiskThresholds::default(),
            follow_up: FollowUpPolicy::default(),
        }
    }

    /// Build from `CHT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup(ENV_DB_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path().ok_or(ConfigError::NoDataDir)?,
        };

        let mut config = Self::with_db_path(db_path);

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BIND_ADDR,
                value: addr.clone(),
            })?;
        }
        if let Some(ttl) = lookup(ENV_TOKEN_TTL) {
            config.auth.token_ttl_minutes =
                parse_bounded(ENV_TOKEN_TTL, &ttl, MAX_TOKEN_TTL_MINUTES)?;
        }
        if let Some(iterations) = lookup(ENV_PBKDF2_ITERATIONS) {
            let parsed =
                parse_bounded(ENV_PBKDF2_ITERATIONS, &iterations, u64::from(u32::MAX))?;
            config.auth.pbkdf2_iterations =
                u32::try_from(parsed).map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PBKDF2_ITERATIONS,
                    value: iterations.clone(),
                })?;
        }

        Ok(config)
    }
}

/// Parse an integer in `1..=max`.
fn parse_bounded(key: &'static str, value: &str, max: u64) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
