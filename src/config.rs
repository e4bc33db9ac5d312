//! Service configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 15 * 60;
pub const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub api_base: String,
    pub application_id: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub session_idle: Duration,
    pub session_sweep: Duration,
    /// Thumbnail URLs the demo gallery page streams.
    pub demo_image_urls: Vec<String>,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `PLATFORM_APPLICATION_ID`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PLATFORM_API_BASE`: default platform API URL
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: default 15
    /// - `HTTP_CONNECT_TIMEOUT_SECS`: default 5
    /// - `SESSION_IDLE_SECS`: default 900
    /// - `SESSION_SWEEP_SECS`: default 60
    /// - `DEMO_IMAGE_URLS`: comma-separated
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or `PORT` is not a
    /// valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let application_id = std::env::var("PLATFORM_APPLICATION_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("PLATFORM_APPLICATION_ID"))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let api_base = std::env::var("PLATFORM_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            port,
            api_base,
            application_id,
            request_timeout_secs: env_parse("HTTP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse("HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            session_idle: Duration::from_secs(env_parse("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)),
            session_sweep: Duration::from_secs(env_parse("SESSION_SWEEP_SECS", DEFAULT_SESSION_SWEEP_SECS)),
            demo_image_urls: parse_list(std::env::var("DEMO_IMAGE_URLS").ok().as_deref()),
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
