use std::collections::HashMap;
use std::sync::Arc;

use auth::PasswordHasher;
use auth::SessionTokenCodec;
use chrono::Utc;

use crate::auth::errors::AuthError;
use crate::auth::models::ExternalProfile;
use crate::auth::models::ProviderKind;
use crate::auth::models::RegisterCommand;
use crate::auth::models::Session;
use crate::auth::ports::OAuthProvider;
use crate::user::errors::UserError;
use crate::user::models::EmailAddress;
use crate::user::models::User;
use crate::user::models::UserId;
use crate::user::models::Username;
use crate::user::ports::UserRepository;

/// Auth gateway: the facade the HTTP handlers call.
///
/// Composes password verification, session token issuance, the federation
/// providers, and the identity linker. Written once against the
/// `OAuthProvider` port; provider-specific behavior lives entirely in the
/// implementations.
pub struct AuthService<R>
where
    R: UserRepository,
{
    repository: Arc<R>,
    password_hasher: PasswordHasher,
    token_codec: Arc<SessionTokenCodec>,
    providers: HashMap<ProviderKind, Arc<dyn OAuthProvider>>,
}

impl<R> AuthService<R>
where
    R: UserRepository,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store adapter
    /// * `token_codec` - Session token codec, shared with the HTTP gate
    /// * `providers` - Federation providers keyed by kind
    pub fn new(
        repository: Arc<R>,
        token_codec: Arc<SessionTokenCodec>,
        providers: HashMap<ProviderKind, Arc<dyn OAuthProvider>>,
    ) -> Self {
        Self {
            repository,
            password_hasher: PasswordHasher::new(),
            token_codec,
            providers,
        }
    }

    /// Register a local account and issue a session for it.
    ///
    /// # Errors
    /// * `DuplicateUser` - Username or email is already taken
    /// * `Persistence` - Storage operation failed
    pub async fn register(&self, command: RegisterCommand) -> Result<Session, AuthError> {
        let password_hash = self.password_hasher.hash(&command.password)?;

        let user = User::new_local(command.username, command.email, password_hash);
        let created = self.repository.create(user).await?;

        tracing::info!(user_id = %created.id, "Registered local account");

        self.issue_session(created)
    }

    /// Authenticate a local account and issue a session for it.
    ///
    /// Unknown username, a federated-only account (no password hash), and
    /// a wrong password all fail with the same `InvalidCredentials` error;
    /// the cases are observably identical to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let username =
            Username::new(username.to_string()).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .repository
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(stored_hash) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(user)
    }

    /// Build the authorization redirect URL for a provider.
    ///
    /// No side effects beyond URL construction (WeChat also generates its
    /// random state value inside the provider).
    pub fn begin_oauth(&self, kind: ProviderKind) -> Result<String, AuthError> {
        Ok(self.provider(kind)?.authorization_url())
    }

    /// Complete an authorization-code flow: exchange the code, fetch the
    /// external profile, link or create the local user, issue a session.
    ///
    /// # Errors
    /// * `TokenExchange` / `ProfileFetch` - Provider round trip failed
    /// * `Persistence` - Linking write failed (including the loser of a
    ///   concurrent first-login race)
    pub async fn complete_oauth(
        &self,
        kind: ProviderKind,
        code: &str,
    ) -> Result<Session, AuthError> {
        let provider = self.provider(kind)?;

        let token = provider.exchange_code(code).await?;
        let profile = provider.fetch_profile(&token).await?;

        let user = self
            .link_or_create(kind, &profile, &token.access_token)
            .await?;

        self.issue_session(user)
    }

    /// Resolve the subject of a validated session token.
    ///
    /// A token whose subject no longer exists is an invalid session, not a
    /// distinct "user deleted" condition.
    pub async fn authenticated_user(&self, id: &UserId) -> Result<User, AuthError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AuthError::InvalidSession)
    }

    fn provider(&self, kind: ProviderKind) -> Result<&Arc<dyn OAuthProvider>, AuthError> {
        self.providers
            .get(&kind)
            .ok_or(AuthError::ProviderNotConfigured(kind))
    }

    fn issue_session(&self, user: User) -> Result<Session, AuthError> {
        let token = self.token_codec.issue(&user.id.to_string())?;
        Ok(Session { token, user })
    }

    /// Resolve an external profile to a local user.
    ///
    /// Found: refresh the avatar (always) and, for GitHub, the stored
    /// provider access token, as a single update. Not found: create a new
    /// user from the profile as a single insert. The lookup-then-create
    /// pair is not transactionally guarded; the storage unique constraint
    /// on the provider id column decides concurrent first-logins, and the
    /// loser surfaces a persistence error to its caller.
    async fn link_or_create(
        &self,
        kind: ProviderKind,
        profile: &ExternalProfile,
        access_token: &str,
    ) -> Result<User, AuthError> {
        let existing = self
            .repository
            .find_by_provider_id(kind, &profile.provider_id)
            .await?;

        if let Some(mut user) = existing {
            user.avatar_url = profile.avatar_url.clone();
            if kind == ProviderKind::Github {
                user.github_access_token = Some(access_token.to_string());
            }
            return Ok(self.repository.update(user).await?);
        }

        let username = match Username::new(profile.display_name.clone()) {
            Ok(username) => username,
            // Synthesize a stable name when the profile's display name is
            // unusable as a username.
            Err(_) => Username::new(format!("{}_{}", kind, profile.provider_id))
                .map_err(UserError::from)?,
        };

        let email = profile
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .and_then(|e| match EmailAddress::new(e.to_string()) {
                Ok(email) => Some(email),
                Err(err) => {
                    tracing::warn!(provider = %kind, error = %err, "Dropping invalid profile email");
                    None
                }
            });

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username,
            email,
            password_hash: None,
            github_id: (kind == ProviderKind::Github).then(|| profile.provider_id.clone()),
            wechat_id: (kind == ProviderKind::Wechat).then(|| profile.provider_id.clone()),
            avatar_url: profile.avatar_url.clone(),
            github_access_token: (kind == ProviderKind::Github)
                .then(|| access_token.to_string()),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(user).await?;

        tracing::info!(
            user_id = %created.id,
            provider = %kind,
            "Linked new federated identity"
        );

        Ok(created)
    }
}
