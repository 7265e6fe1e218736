use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::SessionResponse;
use crate::domain::user::ports::UserRepository;
use crate::inbound::http::router::AppState;

pub async fn login<R>(
    State(state): State<AppState<R>>,
    Json(body): Json<LoginRequestBody>,
) -> Result<Json<SessionResponse>, ApiError>
where
    R: UserRepository,
{
    let session = state
        .auth_service
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(SessionResponse::from(&session)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    username: String,
    password: String,
}
