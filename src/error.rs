// Error handling module
// Classifies transport, protocol and storage failures for callers

use thiserror::Error;

/// Errors that can occur while talking to the audit API or managing the session
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure before a response was received
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("Request failed: {status} - {message}")]
    Request { status: u16, message: String },

    /// Non-2xx response from login or signup
    #[error("Authentication failed: {status} - {message}")]
    Auth { status: u16, message: String },

    /// Response body was not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(String),

    /// Persisted session could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ClientError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } | ClientError::Auth { status, .. } => {
                Some(*status)
            }
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 401/403 answers, i.e. the credentials were rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Reclassify a generic request failure as an authentication failure
    pub(crate) fn into_auth(self) -> Self {
        match self {
            ClientError::Request { status, message } => ClientError::Auth { status, message },
            other => other,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
