//! Runtime configuration read from environment variables.
//!
//! `from_lookup` does the parsing against any key/value source so tests do
//! not have to touch the process environment. `from_env` is the thin
//! wrapper used by the binary, after `dotenvy` has loaded `.env`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use todo_store::StoreConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    pub enable_metrics: bool,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Todo List API".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            store: StoreConfig::new("todos.db"),
            cors_origins: vec!["*".to_string()],
            enable_metrics: true,
            static_dir: PathBuf::from("../frontend"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = lookup("APP_NAME") {
            config.app_name = name;
        }
        if let Some(version) = lookup("APP_VERSION") {
            config.app_version = version;
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_number("PORT", port)?;
        }

        let db_path = match lookup("DATABASE_URL") {
            Some(url) => database_path_from_url(&url),
            None => lookup("DATABASE_NAME").unwrap_or_else(|| "todos.db".to_string()),
        };
        config.store = StoreConfig::new(db_path);
        if let Some(ms) = lookup("DATABASE_BUSY_TIMEOUT_MS") {
            let ms: u64 = parse_number("DATABASE_BUSY_TIMEOUT_MS", ms)?;
            config.store = config.store.with_busy_timeout(Duration::from_millis(ms));
        }

        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(flag) = lookup("ENABLE_METRICS") {
            config.enable_metrics = parse_bool("ENABLE_METRICS", flag)?;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts `sqlite://path`, `sqlite:path` or a bare path.
fn database_path_from_url(url: &str) -> String {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
        .to_string()
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value,
        expected: "a non-negative integer",
    })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            expected: "a boolean",
        }),
    }
}
