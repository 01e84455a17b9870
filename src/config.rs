use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default forum root.
pub const DEFAULT_BASE_URL: &str = "https://forums.somethingawful.com";

/// User agent sent when `SA_USER_AGENT` is not set.
pub const DEFAULT_USER_AGENT: &str = concat!("sa-thread-scraper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Account
    pub username: Option<String>,
    pub password: Option<String>,

    // Forum
    pub base_url: String,

    // Session persistence
    pub cookies_file_path: PathBuf,

    // Raw page backups
    pub page_backup_dir: Option<PathBuf>,

    // HTTP
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Credentials are optional here; they are only required once the
    /// client actually needs to log in.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Account
            username: optional_env("SA_USERNAME"),
            password: optional_env("SA_PASSWORD"),

            // Forum
            base_url: env_or_default("SA_BASE_URL", DEFAULT_BASE_URL),

            // Session persistence
            cookies_file_path: PathBuf::from(env_or_default("SA_COOKIES_FILE", ".cookies")),

            // Raw page backups
            page_backup_dir: optional_env("SA_PAGE_BACKUP_DIR").map(PathBuf::from),

            // HTTP
            http_timeout: Duration::from_secs(parse_env_u64("SA_HTTP_TIMEOUT_SECS", 30)?),
            user_agent: env_or_default("SA_USER_AGENT", DEFAULT_USER_AGENT),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "SA_HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Err(e) = Url::parse(&self.base_url) {
            return Err(ConfigError::InvalidValue {
                name: "SA_BASE_URL".to_string(),
                message: e.to_string(),
            });
        }
        Ok(())
    }

    /// Configuration pointing at a local server with throwaway credentials.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            username: Some("testuser".to_string()),
            password: Some("testpass".to_string()),
            base_url: "http://127.0.0.1".to_string(),
            cookies_file_path: std::env::temp_dir().join("sa-thread-scraper-test.cookies"),
            page_backup_dir: None,
            http_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
