//! Error types for the Plex client.

use thiserror::Error;

use crate::helpers::http_client::HttpClientError;

/// Errors that can occur when talking to a Plex Media Server.
#[derive(Error, Debug)]
pub enum PlexError {
    /// The request could not be issued or its body could not be read
    #[error("Transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// The response body did not have the expected shape
    #[error("Failed to decode response at {path}: {message}")]
    Decode { path: String, message: String },

    /// No active session matched the requested player
    #[error("No track currently playing on {client}")]
    NotFound { client: String },
}

impl PlexError {
    pub(crate) fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        PlexError::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for Plex client operations.
pub type Result<T> = std::result::Result<T, PlexError>;
