//! Error types for notecard-core

use thiserror::Error;

/// Result type alias for API client operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the API client and auth layer.
///
/// HTTP-level failures are always returned as values; nothing in the client
/// panics on a bad response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 401 survived the refresh attempt, or no refresh was possible
    #[error("Authentication failed. Please login again.")]
    AuthenticationFailed,

    /// A successful response did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Token storage error
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

/// Errors from the timestamp formatting helpers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
