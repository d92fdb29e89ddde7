//! Error types for QuoIntelligence API operations.

use thiserror::Error;

/// Errors that can occur during QuoIntelligence API operations.
#[derive(Debug, Error)]
pub enum QiError {
    /// Configuration is missing or invalid (credentials, URL, certificate).
    #[error("QuoIntelligence configuration error: {0}")]
    Config(String),

    /// Caller-supplied arguments are conflicting or malformed.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// The login endpoint rejected the credentials.
    #[error("Authentication failure: {0}")]
    Authentication(String),

    /// A data endpoint answered with a non-success status.
    #[error("Error occurred accessing {path} (HTTP {status}): {body}")]
    Query {
        path: String,
        status: u16,
        body: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl QiError {
    /// HTTP status carried by a [`QiError::Query`], if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for QuoIntelligence operations.
pub type Result<T> = core::result::Result<T, QiError>;
