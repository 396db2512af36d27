//! Error types for the core library.

use thiserror::Error;

use crate::verification::{RecordId, ValidationError};

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required address fields are missing.
    #[error("Invalid address: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// The record store did not accept a create or update.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The provider exchange did not complete successfully.
    #[error("Error connecting to address provider. Status Code: {} Status Text: {reason}", status_text(.status))]
    Transport {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Reason phrase or transport failure description.
        reason: String,
    },

    /// The provider response lacked the expected structure.
    #[error("Address provider failed on record {record_id}: {reason}")]
    ProviderFormat {
        /// Attempt record that was committed before this error surfaced.
        record_id: RecordId,
        /// What was wrong with the response.
        reason: String,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Broad error category, for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller.
    Validation,
    /// Record store failure.
    Persistence,
    /// Provider unreachable or returned a non-success status.
    Transport,
    /// Provider answered with an unexpected response shape.
    ProviderFormat,
    /// Configuration could not be loaded or is invalid.
    Config,
}

impl ErrorKind {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Persistence => "persistence",
            Self::Transport => "transport",
            Self::ProviderFormat => "provider format",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Persistence(_) | Self::Database(_) => ErrorKind::Persistence,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::ProviderFormat { .. } => ErrorKind::ProviderFormat,
            Self::Serde(_) | Self::Io(_) | Self::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<addressledger_melissa::Error> for Error {
    fn from(err: addressledger_melissa::Error) -> Self {
        use addressledger_melissa::Error as Melissa;

        match err {
            Melissa::InvalidConfig(msg) => Self::Config(msg),
            Melissa::Url(e) => Self::Config(format!("invalid endpoint: {e}")),
            other => Self::Transport {
                status: None,
                reason: other.to_string(),
            },
        }
    }
}

#[allow(clippy::ref_option)]
fn status_text(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
