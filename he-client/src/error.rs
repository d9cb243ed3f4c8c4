//! Client error types

use reqwest::StatusCode;
use shared::{JobId, Operation};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key configured
    #[error("API key is not defined (set HE_API_KEY)")]
    MissingApiKey,

    /// Server rejected the API key
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// WebSocket transport failed
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Job finished with a non-success status
    #[error("{operation} job {job_id} failed")]
    JobFailed { job_id: JobId, operation: Operation },

    /// Notification channel is closed
    #[error("Notification channel closed")]
    ConnectionClosed,

    /// Gave up waiting for a job
    #[error("Timed out waiting for job {0}")]
    TimedOut(JobId),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<tungstenite::Error> for ClientError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed
            }
            other => Self::WebSocket(Box::new(other)),
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or rejected API key; not retryable
    Auth,
    /// HTTP or socket failure
    Transport,
    /// Malformed or unexpected payload
    Protocol,
    /// Job completed with `success = false`
    RemoteOperation,
    /// Notification channel lost
    ConnectionClosed,
    /// Caller-supplied deadline expired
    TimedOut,
    /// Client misconfiguration
    Config,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::RemoteOperation => "remote_operation",
            Self::ConnectionClosed => "connection_closed",
            Self::TimedOut => "timed_out",
            Self::Config => "config",
        }
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey | Self::Unauthorized(_) => ErrorKind::Auth,
            Self::Http(_) | Self::Status { .. } | Self::WebSocket(_) => ErrorKind::Transport,
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorKind::Protocol,
            Self::JobFailed { .. } => ErrorKind::RemoteOperation,
            Self::ConnectionClosed => ErrorKind::ConnectionClosed,
            Self::TimedOut(_) => ErrorKind::TimedOut,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Job id the error refers to, if any
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobFailed { job_id, .. } | Self::TimedOut(job_id) => Some(job_id),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
