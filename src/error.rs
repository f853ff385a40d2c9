//! Error types for the Battery Tender client.

use thiserror::Error;

use crate::request::Response;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The login endpoint itself answered 401. Carries the login response.
    #[error("Authorization failed ({})", .response.status)]
    Authorization { response: Response },

    /// Transport failure (connection, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
