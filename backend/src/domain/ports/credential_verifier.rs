//! Driven port for validating bearer credentials.
//!
//! Token format and signing belong to the authentication subsystem. The relay
//! only needs the subject id and username once a token has been accepted.

use async_trait::async_trait;

use crate::domain::Credential;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential verifier adapters.
    pub enum CredentialVerifierError {
        /// Token could not be decoded or lacks required claims.
        Malformed { message: String } => "credential is malformed: {message}",
        /// Token was well formed but is past its expiry.
        Expired => "credential has expired",
        /// Token signature or issuer was not accepted.
        Rejected { message: String } => "credential was rejected: {message}",
    }
}

/// Claims extracted from an accepted credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// Subject claim identifying the user.
    pub user_id: String,
    /// Username claim shown to other users.
    pub username: String,
}

/// Port for turning a bearer credential into verified claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify the credential and return its identity claims.
    async fn verify(&self, credential: &Credential)
    -> Result<VerifiedClaims, CredentialVerifierError>;
}
