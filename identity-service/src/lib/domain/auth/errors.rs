use thiserror::Error;

use crate::auth::models::ProviderKind;
use crate::user::errors::UserError;

/// Failures of the external provider round trips.
#[derive(Debug, Clone, Error)]
pub enum OAuthError {
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),
}

/// Top-level error taxonomy for the auth gateway.
///
/// Every variant is terminal for the current request; nothing here is
/// retried internally.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Request carried a structurally invalid field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Local login failed. Unknown username and wrong password are
    /// deliberately indistinguishable to avoid username enumeration.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A syntactically valid session no longer resolves to a user.
    #[error("Invalid session")]
    InvalidSession,

    #[error("Failed to create user: {0}")]
    DuplicateUser(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),

    #[error("OAuth provider not configured: {0}")]
    ProviderNotConfigured(ProviderKind),

    #[error("Session token error: {0}")]
    Token(#[from] auth::SessionTokenError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] auth::PasswordError),
}

impl From<OAuthError> for AuthError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::TokenExchange(msg) => AuthError::TokenExchange(msg),
            OAuthError::ProfileFetch(msg) => AuthError::ProfileFetch(msg),
        }
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameAlreadyExists(_) | UserError::EmailAlreadyExists(_) => {
                AuthError::DuplicateUser(err.to_string())
            }
            UserError::ExternalIdAlreadyLinked(_) | UserError::DatabaseError(_) => {
                AuthError::Persistence(err.to_string())
            }
            UserError::InvalidUserId(_)
            | UserError::InvalidUsername(_)
            | UserError::InvalidEmail(_) => AuthError::Validation(err.to_string()),
        }
    }
}
