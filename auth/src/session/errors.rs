use thiserror::Error;

/// Error type for session token operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("Failed to encode session token: {0}")]
    EncodingFailed(String),

    #[error("Session token is malformed")]
    Malformed,

    #[error("Session token is invalid")]
    InvalidToken,

    #[error("Session token is expired")]
    Expired,
}
