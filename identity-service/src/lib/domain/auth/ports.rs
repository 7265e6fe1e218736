use async_trait::async_trait;

use crate::auth::errors::OAuthError;
use crate::auth::models::ExternalProfile;
use crate::auth::models::OAuthToken;
use crate::auth::models::ProviderKind;

/// Capability port for an external OAuth-style provider.
///
/// Both federation targets (GitHub, WeChat) implement this interface, so
/// the gateway is written once against it. Each operation is an
/// independent round trip to the provider; nothing is persisted here.
#[async_trait]
pub trait OAuthProvider: Send + Sync + 'static {
    /// Which provider this instance talks to.
    fn kind(&self) -> ProviderKind;

    /// Build the provider's authorization redirect URL.
    ///
    /// WeChat additionally embeds a freshly generated random `state`
    /// value in the URL as a CSRF binding.
    fn authorization_url(&self) -> String;

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    /// * `TokenExchange` - Transport failure, non-2xx response, or
    ///   unparsable body. Not retried.
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, OAuthError>;

    /// Fetch the external profile for an access token.
    ///
    /// # Errors
    /// * `ProfileFetch` - Transport failure or decode failure
    async fn fetch_profile(&self, token: &OAuthToken) -> Result<ExternalProfile, OAuthError>;
}
