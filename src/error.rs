//! Centralized error handling.

use thiserror::Error;

use crate::constants::FATAL_EXIT_CODE;

/// Application-wide error type.
///
/// Every wrapper around an external call returns this type; the pipeline
/// decides which failures end the run and which are only logged.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration file missing, unreadable or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Password could not be obtained
    #[error("Credential error: {0}")]
    Credential(String),

    /// Transport-level failure (connect, timeout, TLS, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// Server answered with a body we could not interpret
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    /// CSV read or parse failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Local file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Exit code the process terminates with when this error is fatal.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        FATAL_EXIT_CODE
    }
}

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;
