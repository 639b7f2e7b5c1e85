use thiserror::Error;

use receivables_allocation::CollaboratorError;
use receivables_core::DomainError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The envelope reported failure even though HTTP succeeded.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid record from backend: {0}")]
    InvalidRecord(#[from] DomainError),

    #[error("client setup failed: {0}")]
    Setup(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Parse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<ClientError> for CollaboratorError {
    fn from(e: ClientError) -> Self {
        let message = e.to_string();
        match e {
            ClientError::Timeout | ClientError::Network(_) | ClientError::Setup(_) => {
                CollaboratorError::Unavailable(message)
            }
            ClientError::Api { status: 409, .. } => CollaboratorError::Conflict(message),
            ClientError::Api { status, .. } if status >= 500 => {
                CollaboratorError::Unavailable(message)
            }
            ClientError::Api { .. }
            | ClientError::Rejected(_)
            | ClientError::Parse(_)
            | ClientError::UnexpectedShape(_)
            | ClientError::InvalidRecord(_) => CollaboratorError::Rejected(message),
        }
    }
}
