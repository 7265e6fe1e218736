use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::user::models::EmailAddress;
use crate::user::models::User;
use crate::user::models::Username;

/// External OAuth-style providers the service can federate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Github,
    Wechat,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Github => write!(f, "github"),
            ProviderKind::Wechat => write!(f, "wechat"),
        }
    }
}

/// Access token obtained from a provider's token endpoint.
///
/// WeChat's token response also carries the `openid` that doubles as the
/// provider user key; GitHub identifies the user only via the profile
/// endpoint.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub access_token: String,
    pub provider_user_key: Option<String>,
}

/// Normalized identity data fetched from a provider after token exchange.
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    pub provider_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// A freshly issued session: the signed token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Command to register a local account with validated fields.
#[derive(Debug)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(username: Username, email: EmailAddress, password: String) -> Self {
        Self {
            username,
            email,
            password,
        }
    }
}
