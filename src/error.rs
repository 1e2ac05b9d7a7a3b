use std::time::Duration;
use thiserror::Error;

/// Coarse classification used by the session and the retry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing usable was handed to the session
    InvalidInput,
    /// The local file could not be decoded as an image
    Decode,
    /// The request never completed (connectivity, timeout)
    Transport,
    /// The service answered, but with a rejection or a malformed body
    Service,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image '{name}': {reason}")]
    Decode { name: String, reason: String },

    #[error("Request to compression service failed: {0}")]
    Transport(String),

    #[error("Compression service did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Compression service returned HTTP {status}: {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("Malformed compression service response: {0}")]
    MalformedResponse(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NoFileSelected | SessionError::FileTooLarge(..) | SessionError::Io(_) => {
                ErrorKind::InvalidInput
            }
            SessionError::Decode { .. } => ErrorKind::Decode,
            SessionError::Transport(_) | SessionError::Timeout(_) => ErrorKind::Transport,
            SessionError::ServiceStatus { .. }
            | SessionError::MalformedResponse(_)
            | SessionError::InvalidUrl { .. } => ErrorKind::Service,
        }
    }

    /// Only transport failures are worth another attempt; a service
    /// rejection is assumed to be permanent.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_decode() {
            SessionError::MalformedResponse(error.to_string())
        } else {
            SessionError::Transport(error.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
