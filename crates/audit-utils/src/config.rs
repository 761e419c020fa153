//! Application-level configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading application configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The log format name is not recognized
    #[error("unknown log format '{0}', expected 'pretty' or 'json'")]
    UnknownLogFormat(String),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one event per line
    #[default]
    Pretty,
    /// Structured JSON, one object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnknownLogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, etc.)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "seo-audit".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read `APP_ENV` and `LOG_FORMAT` from the environment.
    ///
    /// Production environments default to JSON logs unless `LOG_FORMAT`
    /// says otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let format_var = std::env::var("LOG_FORMAT").ok();
        Self::from_parts(environment, format_var.as_deref())
    }

    fn from_parts(environment: String, log_format: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self {
            environment,
            ..Self::default()
        };
        config.log_format = match log_format {
            Some(raw) => raw.parse()?,
            None if config.is_production() => LogFormat::Json,
            None => LogFormat::Pretty,
        };
        Ok(config)
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
