use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auth::SessionTokenCodec;
use identity_service::config::Config;
use identity_service::domain::auth::models::ProviderKind;
use identity_service::domain::auth::ports::OAuthProvider;
use identity_service::domain::auth::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::oauth::GithubProvider;
use identity_service::outbound::oauth::WechatProvider;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        session_ttl_hours = config.session.ttl_hours,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    // One HTTP client shared by both providers. The timeout bounds every
    // provider round trip so a stalled upstream cannot pin a request.
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("identity-service/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut providers: HashMap<ProviderKind, Arc<dyn OAuthProvider>> = HashMap::new();
    providers.insert(
        ProviderKind::Github,
        Arc::new(GithubProvider::new(
            http_client.clone(),
            config.oauth.github.client_id,
            config.oauth.github.client_secret,
            config.oauth.github.redirect_uri,
        )),
    );
    providers.insert(
        ProviderKind::Wechat,
        Arc::new(WechatProvider::new(
            http_client,
            config.oauth.wechat.app_id,
            config.oauth.wechat.app_secret,
            config.oauth.wechat.redirect_uri,
        )),
    );

    let token_codec = Arc::new(SessionTokenCodec::new(
        config.session.secret.as_bytes(),
        chrono::Duration::hours(config.session.ttl_hours),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let auth_service = Arc::new(AuthService::new(
        user_repository,
        Arc::clone(&token_codec),
        providers,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, token_codec);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
