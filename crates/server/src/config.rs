use std::env;
use std::num::ParseIntError;
use std::str::FromStr;

use readlog_core::PreviewConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number: {source}")]
    InvalidNumber {
        name: &'static str,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub preview_timeout_secs: u64,
    pub allow_private_hosts: bool,
    pub is_dev: bool,
}

impl ServerConfig {
    /// Reads configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            server_host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_number(&lookup, "PORT", 8080)?,
            preview_timeout_secs: parse_number(&lookup, "PREVIEW_TIMEOUT_SECS", 10)?,
            allow_private_hosts: lookup("PREVIEW_ALLOW_PRIVATE_HOSTS")
                .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            is_dev: lookup("APP_ENV").as_deref() != Some("production"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Engine configuration derived from the server settings.
    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig::builder()
            .timeout(self.preview_timeout_secs)
            .allow_private_hosts(self.allow_private_hosts)
            .build()
    }
}

fn parse_number<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|source| ConfigError::InvalidNumber { name, source }),
        None => Ok(default),
    }
}
