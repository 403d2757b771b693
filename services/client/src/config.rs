//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use event_planner_core::search::{SearchConfig, MAX_DEBOUNCE, MIN_DEBOUNCE};
use event_planner_core::validation::PasswordPolicy;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which backend deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Development => "http://localhost:8000",
            Self::Production => "https://your-production-domain.com",
        }
    }
}

/// Base URL plus the three API roots every adapter builds on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub auth: String,
    pub events: String,
    pub location: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            auth: format!("{base_url}/api/auth"),
            events: format!("{base_url}/api/events"),
            location: format!("{base_url}/api/location"),
            base_url,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub endpoints: Endpoints,
    pub log_level: Level,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    pub search: SearchConfig,
    pub password_policy: PasswordPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Deployment & Endpoints ---
        let environment = match lookup("PLANNER_ENV") {
            Some(value) => Environment::parse(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PLANNER_ENV".to_string(),
                    format!("'{}' is not one of development, production", value),
                )
            })?,
            None => Environment::Development,
        };

        let base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| environment.default_base_url().to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' must start with http:// or https://", base_url),
            ));
        }
        let endpoints = Endpoints::new(&base_url);

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Local State & Transport ---
        let session_file = lookup("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.planner-session.json"));

        let request_timeout =
            Duration::from_secs(parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 15)?);

        // --- Search & Validation ---
        let debounce = Duration::from_millis(parse_number(&lookup, "SEARCH_DEBOUNCE_MS", 300)?);
        if debounce < MIN_DEBOUNCE || debounce > MAX_DEBOUNCE {
            return Err(ConfigError::InvalidValue(
                "SEARCH_DEBOUNCE_MS".to_string(),
                format!(
                    "{}ms is outside {}-{}ms",
                    debounce.as_millis(),
                    MIN_DEBOUNCE.as_millis(),
                    MAX_DEBOUNCE.as_millis()
                ),
            ));
        }
        let min_query_len = parse_number(&lookup, "SEARCH_MIN_QUERY_LEN", 3)? as usize;
        let password_min_len = parse_number(&lookup, "PASSWORD_MIN_LEN", 8)? as usize;

        Ok(Self {
            environment,
            endpoints,
            log_level,
            session_file,
            request_timeout,
            search: SearchConfig {
                debounce,
                min_query_len,
            },
            password_policy: PasswordPolicy {
                min_len: password_min_len,
            },
        })
    }
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue(key.to_string(), format!("'{}': {}", raw, e))
        }),
        None => Ok(default),
    }
}
