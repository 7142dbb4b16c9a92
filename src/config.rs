use rand::Rng;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::{
    Dimensions, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, DEFAULT_SUBSCRIBER_BUFFER,
    MAX_SUBSCRIBER_BUFFER,
};

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("grid of {rows}x{cols} must be non-empty and at most 1,000,000 cells")]
    InvalidGrid { rows: u32, cols: u32 },
}

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub dimensions: Dimensions,
    pub secret_key: String,
    pub subscriber_buffer: usize,
    pub claim_journal: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Unset or blank variables take their defaults. A missing `SECRET_KEY`
    /// is replaced by a random 64-character key, which invalidates sessions
    /// on restart.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let environment = get("ENVIRONMENT").unwrap_or_else(|| "production".to_string());

        let rows = parse_or(get("GRID_ROWS"), "GRID_ROWS", DEFAULT_GRID_ROWS)?;
        let cols = parse_or(get("GRID_COLS"), "GRID_COLS", DEFAULT_GRID_COLS)?;
        let dimensions =
            Dimensions::new(rows, cols).ok_or(ConfigError::InvalidGrid { rows, cols })?;

        let subscriber_buffer = parse_or(
            get("SUBSCRIBER_BUFFER"),
            "SUBSCRIBER_BUFFER",
            DEFAULT_SUBSCRIBER_BUFFER,
        )?;
        if !(1..=MAX_SUBSCRIBER_BUFFER).contains(&subscriber_buffer) {
            return Err(ConfigError::InvalidValue {
                name: "SUBSCRIBER_BUFFER",
                value: subscriber_buffer.to_string(),
            });
        }

        let secret_key = get("SECRET_KEY").unwrap_or_else(generate_secret_key);
        let claim_journal = get("CLAIM_JOURNAL").map(PathBuf::from);

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec![
                format!("http://localhost:{}", port),
                format!("http://127.0.0.1:{}", port),
            ],
        };

        Ok(Self {
            port,
            environment,
            dimensions,
            secret_key,
            subscriber_buffer,
            claim_journal,
            allowed_origins,
        })
    }

    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_ascii_lowercase().as_str(),
            "development" | "dev"
        )
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

/// Random 64-character alphanumeric signing key
pub fn generate_secret_key() -> String {
    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
