use async_trait::async_trait;

use crate::auth::models::ProviderKind;
use crate::user::errors::UserError;
use crate::user::models::User;
use crate::user::models::UserId;
use crate::user::models::Username;

/// Persistence port for the user aggregate — the credential store adapter
/// surface. Creation and update are each a single atomic write; there is
/// no multi-statement transaction scope here.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `ExternalIdAlreadyLinked` - Provider id is already linked to a user
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;

    /// Retrieve user by external provider identity.
    ///
    /// # Arguments
    /// * `provider` - Which provider id column to match
    /// * `provider_id` - The external identifier
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_provider_id(
        &self,
        provider: ProviderKind,
        provider_id: &str,
    ) -> Result<Option<User>, UserError>;

    /// Update existing user in storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `ExternalIdAlreadyLinked` - Provider id is already linked elsewhere
    /// * `DatabaseError` - Database operation failed or user does not exist
    async fn update(&self, user: User) -> Result<User, UserError>;
}
