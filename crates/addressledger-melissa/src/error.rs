//! Error types for Melissa client operations.

use std::time::Duration;

/// Result type alias for Melissa client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Melissa client error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Response body is not valid JSON for the expected envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response envelope has no `Records` key.
    #[error("Response is missing the Records list")]
    MissingRecords,

    /// Response envelope has an empty `Records` list.
    #[error("Response Records list is empty")]
    EmptyRecords,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}
