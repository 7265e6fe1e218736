use axum::extract::State;
use axum::Extension;
use axum::Json;

use super::ApiError;
use super::UserData;
use crate::domain::user::ports::UserRepository;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Return the profile of the session's subject.
///
/// The session gate has already validated the token; this handler still
/// answers 401 when the subject row no longer exists.
pub async fn current_user<R>(
    State(state): State<AppState<R>>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<Json<UserData>, ApiError>
where
    R: UserRepository,
{
    let user = state
        .auth_service
        .authenticated_user(&authenticated.user_id)
        .await?;

    Ok(Json(UserData::from(&user)))
}
