//! Errors surfaced by the heatmap client.

use thiserror::Error;

/// Failure fetching an aggregate.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No credentials available; nothing was sent.
    #[error("authentication required")]
    AuthRequired,

    /// The server rejected the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid heatmap response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Whether the user must sign in before retrying.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Error state shown by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    AuthRequired,
    Fetch(String),
}

impl From<&FetchError> for ControllerError {
    fn from(err: &FetchError) -> Self {
        if err.is_auth() {
            Self::AuthRequired
        } else {
            Self::Fetch(err.to_string())
        }
    }
}
