//! Client error types.

use rri_protocol::{DocumentError, FrameError, ProtocolError};
use thiserror::Error;

/// Client errors.
///
/// Transport and framing problems are kept apart from [`ClientError::QueryFailed`]
/// so callers can tell "the server said no" from "the exchange broke".
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(#[source] std::io::Error),

    #[error("request timeout")]
    Timeout,

    #[error("framing error: {0}")]
    Framing(#[source] FrameError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{action} failed: {message}")]
    QueryFailed { action: String, message: String },

    #[error("invalid query document: {0}")]
    Document(#[from] DocumentError),

    #[error("session closed")]
    Closed,

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl ClientError {
    /// Returns whether the session is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_)
                | ClientError::Timeout
                | ClientError::Framing(_)
                | ClientError::Protocol(_)
                | ClientError::Closed
        )
    }

    /// Server-provided message for business failures.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::QueryFailed { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<FrameError> for ClientError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => ClientError::Connection(e),
            other => ClientError::Framing(other),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Connection(err)
    }
}
