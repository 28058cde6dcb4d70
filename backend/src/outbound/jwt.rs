//! HS256 JSON Web Token adapter for the `CredentialVerifier` port.
//!
//! Tokens are issued by the authentication service with an `id` claim (string
//! or number), a `username` claim, and an `exp` expiry. Tokens that carry a
//! standard `sub` instead of `id` are also accepted.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::Credential;
use crate::domain::ports::{CredentialVerifier, CredentialVerifierError, VerifiedClaims};

#[derive(Debug, Deserialize)]
struct RelayClaims {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl RelayClaims {
    fn subject(&self) -> Option<String> {
        let from_id = self.id.as_ref().and_then(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        });
        from_id.or_else(|| self.sub.clone())
    }
}

/// Verifies bearer tokens signed with a shared secret.
pub struct JwtCredentialVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCredentialVerifier {
    /// Build a verifier for tokens signed with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_owned());
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

#[async_trait]
impl CredentialVerifier for JwtCredentialVerifier {
    async fn verify(
        &self,
        credential: &Credential,
    ) -> Result<VerifiedClaims, CredentialVerifierError> {
        let token = decode::<RelayClaims>(credential.token(), &self.decoding_key, &self.validation)
            .map_err(|error| {
                debug!(error = ?error.kind(), "JWT validation failed");
                match error.kind() {
                    ErrorKind::ExpiredSignature => CredentialVerifierError::expired(),
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        CredentialVerifierError::rejected(error.to_string())
                    }
                    _ => CredentialVerifierError::malformed(error.to_string()),
                }
            })?;

        let claims = token.claims;
        let user_id = claims
            .subject()
            .ok_or_else(|| CredentialVerifierError::malformed("token has no `id` or `sub` claim"))?;
        let username = claims
            .username
            .ok_or_else(|| CredentialVerifierError::malformed("token has no `username` claim"))?;
        Ok(VerifiedClaims { user_id, username })
    }
}
