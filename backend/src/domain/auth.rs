//! Authentication primitives: bearer credentials and binding failures.
//!
//! Credential parsing lives at the edge (inbound adapters pull the token out
//! of headers, query strings, or cookies); the domain only sees an opaque
//! [`Credential`] and reports failures as [`AuthError`].

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::PresenceError;

/// Bearer token presented during the connection handshake.
///
/// ## Invariants
/// - The token is non-empty once trimmed.
/// - The token bytes are zeroed when the credential is dropped.
///
/// # Examples
/// ```
/// use presence_relay::domain::Credential;
///
/// assert!(Credential::new("  ").is_none());
/// let credential = Credential::new("abc.def.ghi").expect("token present");
/// assert_eq!(credential.token(), "abc.def.ghi");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: Zeroizing<String>,
}

impl Credential {
    /// Wrap a raw bearer token, returning `None` when it is blank.
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            token: Zeroizing::new(trimmed.to_owned()),
        })
    }

    /// The raw token string.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Failures raised while binding an identity to a connection.
///
/// Always fatal to the connection: the adapter signals the error once and
/// then closes the channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was supplied with the handshake.
    #[error("missing credential")]
    MissingCredential,
    /// The credential was malformed, expired, or rejected by the verifier.
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// Verifier or claim validation message.
        reason: String,
    },
    /// The connection is already registered under a different identity.
    #[error("connection is already bound to another identity")]
    AlreadyBound,
}

impl From<PresenceError> for AuthError {
    fn from(error: PresenceError) -> Self {
        match error {
            PresenceError::ClaimedByAnotherUser { .. } => Self::AlreadyBound,
        }
    }
}

impl AuthError {
    /// Helper for verifier rejections.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCredential {
            reason: reason.into(),
        }
    }
}
