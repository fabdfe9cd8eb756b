//! Error types for the Clado client.

use thiserror::Error;

/// Result type for Clado client operations.
pub type Result<T> = std::result::Result<T, CladoError>;

/// Clado client errors.
#[derive(Debug, Error)]
pub enum CladoError {
    /// Non-2xx response from the API
    #[error("Clado API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection, timeout or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Initiation succeeded but the response carried no job id
    #[error("No search ID returned from Clado")]
    MissingJobId,
}
