use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::auth::errors::OAuthError;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::OAuthToken;
use crate::domain::auth::models::ProviderKind;
use crate::domain::auth::ports::OAuthProvider;

const AUTHORIZE_URL: &str = "https://open.weixin.qq.com/connect/qrconnect";
const TOKEN_URL: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";
const USERINFO_URL: &str = "https://api.weixin.qq.com/sns/userinfo";

/// WeChat OAuth adapter (QR-connect website flow).
///
/// WeChat reports failures as a 200 response with an `errcode`/`errmsg`
/// JSON envelope, so every body is checked for the envelope before its
/// payload fields are trusted. The token response carries the `openid`
/// that keys the user on the provider side.
pub struct WechatProvider {
    http: reqwest::Client,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
}

impl WechatProvider {
    pub fn new(
        http: reqwest::Client,
        app_id: String,
        app_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http,
            app_id,
            app_secret,
            redirect_uri,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WechatTokenResponse {
    access_token: Option<String>,
    openid: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WechatUserResponse {
    openid: Option<String>,
    nickname: Option<String>,
    headimgurl: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

fn parse_token_response(body: &str) -> Result<OAuthToken, OAuthError> {
    let parsed: WechatTokenResponse =
        serde_json::from_str(body).map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

    if let Some(errcode) = parsed.errcode {
        return Err(OAuthError::TokenExchange(format!(
            "wechat error {}: {}",
            errcode,
            parsed.errmsg.unwrap_or_default()
        )));
    }

    match (parsed.access_token, parsed.openid) {
        (Some(access_token), Some(openid)) if !access_token.is_empty() && !openid.is_empty() => {
            Ok(OAuthToken {
                access_token,
                provider_user_key: Some(openid),
            })
        }
        _ => Err(OAuthError::TokenExchange(
            "access_token or openid missing from response".to_string(),
        )),
    }
}

fn parse_profile_response(body: &str, fallback_openid: &str) -> Result<ExternalProfile, OAuthError> {
    let parsed: WechatUserResponse =
        serde_json::from_str(body).map_err(|e| OAuthError::ProfileFetch(e.to_string()))?;

    if let Some(errcode) = parsed.errcode {
        return Err(OAuthError::ProfileFetch(format!(
            "wechat error {}: {}",
            errcode,
            parsed.errmsg.unwrap_or_default()
        )));
    }

    let provider_id = parsed
        .openid
        .filter(|openid| !openid.is_empty())
        .unwrap_or_else(|| fallback_openid.to_string());

    Ok(ExternalProfile {
        display_name: parsed.nickname.unwrap_or_else(|| provider_id.clone()),
        provider_id,
        // WeChat profiles carry no email address.
        email: None,
        avatar_url: parsed.headimgurl.filter(|url| !url.is_empty()),
    })
}

#[async_trait]
impl OAuthProvider for WechatProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wechat
    }

    fn authorization_url(&self) -> String {
        let state = Uuid::new_v4().simple().to_string();

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("appid", &self.app_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "snsapi_login")
            .append_pair("state", &state)
            .finish();

        format!("{AUTHORIZE_URL}?{query}")
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, OAuthError> {
        let response = self
            .http
            .get(TOKEN_URL)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
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

        parse_token_response(&body)
    }

    async fn fetch_profile(&self, token: &OAuthToken) -> Result<ExternalProfile, OAuthError> {
        let openid = token.provider_user_key.as_deref().ok_or_else(|| {
            OAuthError::ProfileFetch("openid missing from token exchange".to_string())
        })?;

        let response = self
            .http
            .get(USERINFO_URL)
            .query(&[
                ("access_token", token.access_token.as_str()),
                ("openid", openid),
                ("lang", "zh_CN"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::ProfileFetch(e.to_string()))?;

        parse_profile_response(&body, openid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> WechatProvider {
        WechatProvider::new(
            reqwest::Client::new(),
            "wx-app-id".to_string(),
            "wx-app-secret".to_string(),
            "https://notes.example.com/api/auth/wechat/callback".to_string(),
        )
    }

    #[test]
    fn authorization_url_carries_qrconnect_params() {
        let url = provider().authorization_url();

        assert!(url.starts_with("https://open.weixin.qq.com/connect/qrconnect?"));
        assert!(url.contains("appid=wx-app-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=snsapi_login"));
        assert!(url.contains("state="));
    }

    #[test]
    fn authorization_url_state_is_random_per_call() {
        let provider = provider();
        let state_of = |url: &str| {
            url.split('&')
                .find(|part| part.contains("state="))
                .map(|part| part.to_string())
        };

        let first = state_of(&provider.authorization_url());
        let second = state_of(&provider.authorization_url());

        assert!(first.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn token_response_parses_access_token_and_openid() {
        let body = r#"{"access_token":"wx-token","expires_in":7200,"refresh_token":"r","openid":"openid-1","scope":"snsapi_login"}"#;

        let token = parse_token_response(body).unwrap();

        assert_eq!(token.access_token, "wx-token");
        assert_eq!(token.provider_user_key.as_deref(), Some("openid-1"));
    }

    #[test]
    fn token_response_error_envelope_is_rejected() {
        let body = r#"{"errcode":40029,"errmsg":"invalid code"}"#;

        let err = parse_token_response(body).unwrap_err();

        assert!(matches!(err, OAuthError::TokenExchange(msg) if msg.contains("40029")));
    }

    #[test]
    fn token_response_without_openid_is_rejected() {
        let body = r#"{"access_token":"wx-token"}"#;

        assert!(parse_token_response(body).is_err());
    }

    #[test]
    fn profile_response_maps_nickname_and_avatar() {
        let body = r#"{"openid":"openid-1","nickname":"测试用户","headimgurl":"https://wx.qlogo.cn/x/0"}"#;

        let profile = parse_profile_response(body, "openid-1").unwrap();

        assert_eq!(profile.provider_id, "openid-1");
        assert_eq!(profile.display_name, "测试用户");
        assert_eq!(profile.email, None);
        assert_eq!(profile.avatar_url.as_deref(), Some("https://wx.qlogo.cn/x/0"));
    }

    #[test]
    fn profile_response_error_envelope_is_rejected() {
        let body = r#"{"errcode":40003,"errmsg":"invalid openid"}"#;

        let err = parse_profile_response(body, "openid-1").unwrap_err();

        assert!(matches!(err, OAuthError::ProfileFetch(msg) if msg.contains("40003")));
    }

    #[test]
    fn profile_without_nickname_falls_back_to_openid() {
        let body = r#"{"openid":"openid-1"}"#;

        let profile = parse_profile_response(body, "openid-1").unwrap();

        assert_eq!(profile.display_name, "openid-1");
        assert_eq!(profile.avatar_url, None);
    }
}
