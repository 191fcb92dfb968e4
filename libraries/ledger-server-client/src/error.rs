//! Error types for the ledger server client.

use ledger_core::LedgerError;
use thiserror::Error;

/// Errors that can occur when talking to the sync server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ServerClientError {
    /// Classify a transport error
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ServerUnreachable(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

impl From<ServerClientError> for LedgerError {
    fn from(err: ServerClientError) -> Self {
        match err {
            ServerClientError::ServerError { status, message } => {
                LedgerError::RemoteRejected { status, message }
            }
            ServerClientError::AuthFailed(message) => LedgerError::InvalidCredentials(message),
            ServerClientError::InvalidUrl(message) => LedgerError::invalid(message),
            other => LedgerError::RemoteUnreachable(other.to_string()),
        }
    }
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
