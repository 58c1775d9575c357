//! Error handling for the salon client data layer

use std::fmt;
use thiserror::Error;

/// Unified error type for repository and store operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend query errors
    #[error("Database error: {0}")]
    Postgrest(#[from] salon_postgrest::PostgrestError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Network or HTTP client errors
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Create a new input validation error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether the error was raised before any request was made
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
