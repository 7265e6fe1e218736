use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::SessionResponse;
use crate::domain::auth::models::ProviderKind;
use crate::domain::user::ports::UserRepository;
use crate::inbound::http::router::AppState;

/// Query parameters the provider appends when redirecting back.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

pub async fn oauth_callback<R>(
    State(state): State<AppState<R>>,
    Path(provider): Path<ProviderKind>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<SessionResponse>, ApiError>
where
    R: UserRepository,
{
    // TODO: check `query.state` against a server-side store once one
    // exists; today the value is accepted unchecked.
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Authorization code is missing".to_string()))?;

    let session = state.auth_service.complete_oauth(provider, code).await?;

    Ok(Json(SessionResponse::from(&session)))
}
