//! Error types for the Castline server client.

use castline_playback::PlaybackError;
use thiserror::Error;

/// Errors that can occur when talking to a Castline server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Missing or rejected access token
    #[error("Authentication required")]
    AuthRequired,

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
    /// Classify a transport failure from reqwest.
    pub(crate) fn from_send(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ServerUnreachable(error.to_string())
        } else {
            Self::Request(error)
        }
    }
}

impl From<ServerClientError> for PlaybackError {
    fn from(error: ServerClientError) -> Self {
        PlaybackError::Repository(error.to_string())
    }
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
