//! Binds a verified identity to a connection at handshake time.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{CredentialVerifier, CredentialVerifierError};
use crate::domain::{AuthError, Credential, DisplayName, Identity, UserId};

/// Turns handshake credentials into an immutable [`Identity`].
#[derive(Clone)]
pub struct IdentityBinder {
    verifier: Arc<dyn CredentialVerifier>,
}

impl IdentityBinder {
    /// Build a binder around the given verifier.
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify the credential and derive the identity from its claims.
    ///
    /// # Errors
    /// - [`AuthError::MissingCredential`] when no credential was supplied.
    /// - [`AuthError::InvalidCredential`] when the verifier rejects the token
    ///   or its claims do not form a valid identity.
    pub async fn bind(&self, credential: Option<&Credential>) -> Result<Identity, AuthError> {
        let Some(credential) = credential else {
            debug!("handshake arrived without a credential");
            return Err(AuthError::MissingCredential);
        };

        let claims = self
            .verifier
            .verify(credential)
            .await
            .map_err(|error| {
                warn!(error = %error, "credential verification failed");
                match error {
                    CredentialVerifierError::Expired => AuthError::invalid("credential expired"),
                    other => AuthError::invalid(other.to_string()),
                }
            })?;

        let user_id = UserId::new(claims.user_id)
            .map_err(|error| AuthError::invalid(format!("subject claim: {error}")))?;
        let display_name = DisplayName::new(&claims.username)
            .map_err(|error| AuthError::invalid(format!("username claim: {error}")))?;
        Ok(Identity::new(user_id, display_name))
    }
}
