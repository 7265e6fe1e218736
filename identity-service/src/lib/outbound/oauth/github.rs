use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

use crate::domain::auth::errors::OAuthError;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::OAuthToken;
use crate::domain::auth::models::ProviderKind;
use crate::domain::auth::ports::OAuthProvider;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";

/// GitHub OAuth adapter.
///
/// GitHub's token endpoint answers with a URL-encoded body rather than
/// JSON, and the user's external id only becomes known at the profile
/// endpoint.
pub struct GithubProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GithubProvider {
    pub fn new(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
        }
    }
}

/// Pull `access_token` out of GitHub's URL-encoded token response.
fn parse_access_token(body: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
struct GithubUserResponse {
    id: i64,
    login: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Github
    }

    fn authorization_url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", "user:email")
            .finish();

        format!("{AUTHORIZE_URL}?{query}")
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, OAuthError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenExchange(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        let access_token = parse_access_token(&body).ok_or_else(|| {
            OAuthError::TokenExchange("access_token missing from response".to_string())
        })?;

        Ok(OAuthToken {
            access_token,
            provider_user_key: None,
        })
    }

    async fn fetch_profile(&self, token: &OAuthToken) -> Result<ExternalProfile, OAuthError> {
        let response = self
            .http
            .get(USER_URL)
            .bearer_auth(&token.access_token)
            .header(header::ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| OAuthError::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "user endpoint returned {}",
                response.status()
            )));
        }

        let user: GithubUserResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetch(e.to_string()))?;

        Ok(ExternalProfile {
            provider_id: user.id.to_string(),
            display_name: user.login,
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }
}
