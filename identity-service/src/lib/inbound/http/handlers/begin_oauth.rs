use axum::extract::Path;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

use super::ApiError;
use crate::domain::auth::models::ProviderKind;
use crate::domain::user::ports::UserRepository;
use crate::inbound::http::router::AppState;

/// Redirect the browser to the provider's authorization page.
///
/// Responds 302 Found, matching what provider consoles expect for the
/// start of the authorization-code flow.
pub async fn begin_oauth<R>(
    State(state): State<AppState<R>>,
    Path(provider): Path<ProviderKind>,
) -> Result<Response, ApiError>
where
    R: UserRepository,
{
    let url = state.auth_service.begin_oauth(provider)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}
