use std::sync::Arc;
use std::time::Duration;

use auth::SessionTokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::begin_oauth::begin_oauth;
use super::handlers::current_user::current_user;
use super::handlers::health;
use super::handlers::login::login;
use super::handlers::oauth_callback::oauth_callback;
use super::handlers::register::register;
use super::middleware::require_session;
use crate::domain::auth::service::AuthService;
use crate::domain::user::ports::UserRepository;

/// Shared handler state. Generic over the repository so the HTTP surface
/// can be exercised against an in-memory store in tests.
pub struct AppState<R>
where
    R: UserRepository,
{
    pub auth_service: Arc<AuthService<R>>,
    pub token_codec: Arc<SessionTokenCodec>,
}

impl<R> Clone for AppState<R>
where
    R: UserRepository,
{
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            token_codec: Arc::clone(&self.token_codec),
        }
    }
}

pub fn create_router<R>(
    auth_service: Arc<AuthService<R>>,
    token_codec: Arc<SessionTokenCodec>,
) -> Router
where
    R: UserRepository,
{
    let state = AppState {
        auth_service,
        token_codec,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register::<R>))
        .route("/api/auth/login", post(login::<R>))
        .route("/api/auth/:provider", get(begin_oauth::<R>))
        .route("/api/auth/:provider/callback", get(oauth_callback::<R>));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(current_user::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<R>,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
