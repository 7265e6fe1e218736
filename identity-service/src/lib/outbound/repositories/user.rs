use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::auth::models::ProviderKind;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, username, email, password_hash, github_id, wechat_id, \
     avatar_url, github_access_token, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; converted into the domain `User` after fetching so the
/// validated wrapper types are rebuilt on the way out of storage.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: Option<String>,
    github_id: Option<String>,
    wechat_id: Option<String>,
    avatar_url: Option<String>,
    github_access_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, UserError> {
        Ok(User {
            id: UserId(self.id),
            username: Username::new(self.username)?,
            email: self.email.map(EmailAddress::new).transpose()?,
            password_hash: self.password_hash,
            github_id: self.github_id,
            wechat_id: self.wechat_id,
            avatar_url: self.avatar_url,
            github_access_token: self.github_access_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Map a write failure to the domain error, resolving unique violations
/// to the column that raised them.
fn map_write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_username_key") => {
                    return UserError::UsernameAlreadyExists(user.username.as_str().to_string());
                }
                Some("users_email_key") => {
                    return UserError::EmailAlreadyExists(
                        user.email
                            .as_ref()
                            .map(|e| e.as_str().to_string())
                            .unwrap_or_default(),
                    );
                }
                Some("users_github_id_key") => {
                    return UserError::ExternalIdAlreadyLinked(
                        user.github_id.clone().unwrap_or_default(),
                    );
                }
                Some("users_wechat_id_key") => {
                    return UserError::ExternalIdAlreadyLinked(
                        user.wechat_id.clone().unwrap_or_default(),
                    );
                }
                _ => {}
            }
        }
    }
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, github_id, wechat_id,
                               avatar_url, github_access_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.password_hash.as_deref())
        .bind(user.github_id.as_deref())
        .bind(user.wechat_id.as_deref())
        .bind(user.avatar_url.as_deref())
        .bind(user.github_access_token.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn find_by_provider_id(
        &self,
        provider: ProviderKind,
        provider_id: &str,
    ) -> Result<Option<User>, UserError> {
        let query = match provider {
            ProviderKind::Github => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = $1")
            }
            ProviderKind::Wechat => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE wechat_id = $1")
            }
        };

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn update(&self, mut user: User) -> Result<User, UserError> {
        user.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, github_id = $5,
                wechat_id = $6, avatar_url = $7, github_access_token = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.password_hash.as_deref())
        .bind(user.github_id.as_deref())
        .bind(user.wechat_id.as_deref())
        .bind(user.avatar_url.as_deref())
        .bind(user.github_access_token.as_deref())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::DatabaseError(format!(
                "user {} does not exist",
                user.id
            )));
        }

        Ok(user)
    }
}
