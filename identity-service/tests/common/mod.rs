use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::SessionTokenCodec;
use identity_service::domain::auth::errors::OAuthError;
use identity_service::domain::auth::models::ExternalProfile;
use identity_service::domain::auth::models::OAuthToken;
use identity_service::domain::auth::models::ProviderKind;
use identity_service::domain::auth::ports::OAuthProvider;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::user::errors::UserError;
use identity_service::domain::user::models::User;
use identity_service::domain::user::models::UserId;
use identity_service::domain::user::models::Username;
use identity_service::domain::user::ports::UserRepository;
use identity_service::inbound::http::router::create_router;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-signing-at-least-32-bytes";

/// Test application running the real router over an in-memory store and
/// stub providers, so no Postgres or provider network access is needed.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub token_codec: Arc<SessionTokenCodec>,
    pub repository: Arc<InMemoryUserRepository>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::new());
        let token_codec = Arc::new(SessionTokenCodec::new(
            TEST_SECRET,
            chrono::Duration::hours(24),
        ));

        let mut providers: HashMap<ProviderKind, Arc<dyn OAuthProvider>> = HashMap::new();
        providers.insert(
            ProviderKind::Github,
            Arc::new(StubProvider::new(ProviderKind::Github)),
        );
        providers.insert(
            ProviderKind::Wechat,
            Arc::new(StubProvider::new(ProviderKind::Wechat)),
        );

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&token_codec),
            providers,
        ));

        let router = create_router(auth_service, Arc::clone(&token_codec));

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            // Redirects stay observable as 302 responses.
            api_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            token_codec,
            repository,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }
}

/// In-memory user store enforcing the same uniqueness rules as the
/// Postgres schema.
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
        }
    }

    pub fn remove(&self, id: &UserId) {
        self.users
            .lock()
            .expect("user store lock poisoned")
            .retain(|user| user.id != *id);
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().expect("user store lock poisoned").len()
    }
}

fn conflicts(existing: &User, candidate: &User) -> Option<UserError> {
    if existing.username == candidate.username {
        return Some(UserError::UsernameAlreadyExists(
            candidate.username.as_str().to_string(),
        ));
    }
    if let (Some(a), Some(b)) = (&existing.email, &candidate.email) {
        if a == b {
            return Some(UserError::EmailAlreadyExists(b.as_str().to_string()));
        }
    }
    if let (Some(a), Some(b)) = (&existing.github_id, &candidate.github_id) {
        if a == b {
            return Some(UserError::ExternalIdAlreadyLinked(b.clone()));
        }
    }
    if let (Some(a), Some(b)) = (&existing.wechat_id, &candidate.wechat_id) {
        if a == b {
            return Some(UserError::ExternalIdAlreadyLinked(b.clone()));
        }
    }
    None
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().expect("user store lock poisoned");

        for existing in users.iter() {
            if let Some(err) = conflicts(existing, &user) {
                return Err(err);
            }
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|user| user.id == *id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|user| user.username == *username).cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider: ProviderKind,
        provider_id: &str,
    ) -> Result<Option<User>, UserError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users
            .iter()
            .find(|user| match provider {
                ProviderKind::Github => user.github_id.as_deref() == Some(provider_id),
                ProviderKind::Wechat => user.wechat_id.as_deref() == Some(provider_id),
            })
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().expect("user store lock poisoned");

        for existing in users.iter() {
            if existing.id != user.id {
                if let Some(err) = conflicts(existing, &user) {
                    return Err(err);
                }
            }
        }

        let slot = users
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or_else(|| UserError::DatabaseError(format!("user {} does not exist", user.id)))?;

        *slot = user.clone();
        Ok(user)
    }
}

/// Provider stub with deterministic behavior derived from the code:
/// `bad` fails the exchange, any other code yields `token-<code>` and an
/// avatar URL derived from it. Every successful login resolves to the
/// same external user, so repeat logins hit the update path.
pub struct StubProvider {
    kind: ProviderKind,
}

impl StubProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl OAuthProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn authorization_url(&self) -> String {
        format!(
            "https://provider.example.com/{}/authorize?client_id=test-client&state=fixed",
            self.kind
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, OAuthError> {
        if code == "bad" {
            return Err(OAuthError::TokenExchange("bad verification code".to_string()));
        }

        Ok(OAuthToken {
            access_token: format!("token-{code}"),
            provider_user_key: match self.kind {
                ProviderKind::Github => None,
                ProviderKind::Wechat => Some("stub-openid".to_string()),
            },
        })
    }

    async fn fetch_profile(&self, token: &OAuthToken) -> Result<ExternalProfile, OAuthError> {
        let (provider_id, display_name, email) = match self.kind {
            ProviderKind::Github => (
                "1234567".to_string(),
                "octocat".to_string(),
                Some("octocat@example.com".to_string()),
            ),
            ProviderKind::Wechat => ("stub-openid".to_string(), "wx-user".to_string(), None),
        };

        Ok(ExternalProfile {
            provider_id,
            display_name,
            email,
            avatar_url: Some(format!(
                "https://avatars.example.com/{}.png",
                token.access_token
            )),
        })
    }
}
