//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use chrono::Weekday;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Whoop API host. Authorization, token and data endpoints hang off it.
pub const DEFAULT_API_BASE: &str = "https://api.whoop.com";

/// Longest accepted `SYNC_WINDOW_DAYS` (ten years).
pub const MAX_SYNC_WINDOW_DAYS: u32 = 3650;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whoop OAuth client ID (public)
    pub whoop_client_id: String,
    /// Whoop OAuth client secret
    pub whoop_client_secret: String,
    /// Redirect URI registered with Whoop
    pub redirect_uri: String,
    /// Base URL of the Whoop API
    pub api_base_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Port for the local callback / dashboard API server
    pub port: u16,
    /// JSON file backing the key-value store
    pub data_path: PathBuf,
    /// Interval between background syncs
    pub sync_interval: Duration,
    /// Number of days fetched per sync
    pub sync_window_days: u32,
    /// First day of the week for weekly averages
    pub week_start: Weekday,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            whoop_client_id: "test_client_id".to_string(),
            whoop_client_secret: "test_secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/whoop/callback".to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_path: PathBuf::from("data/whoop_state.json"),
            sync_interval: Duration::from_secs(6 * 60 * 60),
            sync_window_days: 30,
            week_start: Weekday::Sun,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let sync_interval = sync_interval_from_hours(parse_var("SYNC_INTERVAL_HOURS", 6)?)?;
        let sync_window_days = checked_window_days(parse_var("SYNC_WINDOW_DAYS", 30)?)?;

        let week_start = match env::var("WEEK_START") {
            Ok(raw) => raw
                .trim()
                .parse::<Weekday>()
                .map_err(|_| ConfigError::Invalid("WEEK_START", raw))?,
            Err(_) => Weekday::Sun,
        };

        Ok(Self {
            whoop_client_id: env::var("WHOOP_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WHOOP_CLIENT_ID"))?,
            whoop_client_secret: env::var("WHOOP_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WHOOP_CLIENT_SECRET"))?,
            redirect_uri: env::var("WHOOP_REDIRECT_URI")
                .unwrap_or_else(|_| format!("http://localhost:{}/auth/whoop/callback", port)),
            api_base_url: env::var("WHOOP_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port,
            data_path: env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/whoop_state.json")),
            sync_interval,
            sync_window_days,
            week_start,
        })
    }
}

/// `SYNC_INTERVAL_HOURS` as a duration; zero and overflowing values are rejected.
fn sync_interval_from_hours(hours: u64) -> Result<Duration, ConfigError> {
    match hours.checked_mul(60 * 60) {
        Some(secs) if hours > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid("SYNC_INTERVAL_HOURS", hours.to_string())),
    }
}

fn checked_window_days(days: u32) -> Result<u32, ConfigError> {
    if (1..=MAX_SYNC_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::Invalid("SYNC_WINDOW_DAYS", days.to_string()))
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
