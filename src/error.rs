//! Error types shared by the executor, crawler and actions.

use thiserror::Error;

/// Errors surfaced by forum operations.
///
/// Session expiry is never reported here: the executor handles it by logging
/// in again. Malformed post containers are skipped by the parser rather than
/// reported.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Required configuration (credentials) is missing or blank.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation needs context (a thread id) that was not supplied.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The server explicitly rejected the login.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The login endpoint answered with a status we do not handle.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The caller passed an invalid combination of arguments.
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// A response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure, passed through unmodified.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
