use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::auth::errors::AuthError;
use crate::user::models::User;

pub mod begin_oauth;
pub mod current_user;
pub mod login;
pub mod oauth_callback;
pub mod register;

/// Error surface of the HTTP API. Every variant renders as a JSON body of
/// the form `{"error": "<message>"}` with the matching status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(_) => ApiError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidSession => {
                ApiError::Unauthorized(err.to_string())
            }
            // Duplicate registration, provider round-trip failures, and
            // storage failures all surface as 500 to the client.
            AuthError::DuplicateUser(_)
            | AuthError::Persistence(_)
            | AuthError::TokenExchange(_)
            | AuthError::ProfileFetch(_)
            | AuthError::ProviderNotConfigured(_)
            | AuthError::Token(_)
            | AuthError::PasswordHash(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

/// Public projection of a user. Never includes the password hash or any
/// stored provider access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            email: user.email.as_ref().map(|e| e.as_str().to_string()),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
        }
    }
}

/// Success body shared by register, login, and the OAuth callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserData,
}

impl From<&crate::auth::models::Session> for SessionResponse {
    fn from(session: &crate::auth::models::Session) -> Self {
        Self {
            token: session.token.clone(),
            user: UserData::from(&session.user),
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
