use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaims;
use super::errors::SessionTokenError;

/// Stateless session token codec.
///
/// Issues and validates compact signed tokens carrying a user identifier
/// and expiry. Uses HS256 (HMAC with SHA-256) with a process-wide secret
/// injected at construction; tokens signed under a different secret are
/// rejected, so rotating the secret invalidates all outstanding sessions
/// at once.
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl SessionTokenCodec {
    /// Create a new codec with a signing secret and a fixed token TTL.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (at least 32 bytes for HS256)
    /// * `ttl` - Lifetime of issued tokens, measured from issuance
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl,
        }
    }

    /// Issue a signed session token for a user identifier.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, user_id: &str) -> Result<String, SessionTokenError> {
        let claims = SessionClaims::new(user_id, Utc::now(), self.ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| SessionTokenError::EncodingFailed(e.to_string()))
    }

    /// Validate a session token and return the embedded user identifier.
    ///
    /// The signature is verified first; expiry is checked second, against
    /// the codec's own clock with no leeway. A token is accepted strictly
    /// before its expiry instant and rejected at or after it.
    ///
    /// # Errors
    /// * `Malformed` - Token is not a structurally valid JWT
    /// * `InvalidToken` - Signature does not match the current secret
    /// * `Expired` - Token expiry has passed
    pub fn validate(&self, token: &str) -> Result<String, SessionTokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked manually below, after the signature.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    SessionTokenError::InvalidToken
                }
                _ => SessionTokenError::Malformed,
            })?;

        if token_data.claims.is_expired(Utc::now().timestamp()) {
            return Err(SessionTokenError::Expired);
        }

        Ok(token_data.claims.sub)
    }
}
