//! Identity primitives bound to authenticated connections.
//!
//! An [`Identity`] is derived from a verified credential and never from
//! client-supplied payload fields. Once bound to a connection it is immutable.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Validation errors returned when constructing identity primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityValidationError {
    /// User id was empty once trimmed.
    #[error("user id must not be empty")]
    EmptyUserId,
    /// User id carried leading or trailing whitespace.
    #[error("user id must not contain surrounding whitespace")]
    PaddedUserId,
    /// Display name was empty once trimmed.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Stable identifier for a user as issued by the authentication service.
///
/// Ids are opaque strings. Numeric ids on the wire normalise to their
/// decimal representation, so `42` and `"42"` address the same user.
///
/// # Examples
/// ```
/// use presence_relay::domain::UserId;
///
/// let id = UserId::new("alice").expect("valid id");
/// assert_eq!(id.as_ref(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = id.into();
        if raw.trim().is_empty() {
            return Err(IdentityValidationError::EmptyUserId);
        }
        if raw.trim() != raw {
            return Err(IdentityValidationError::PaddedUserId);
        }
        Ok(Self(raw))
    }

    /// Interpret a JSON value as a user reference.
    ///
    /// Strings and integers are accepted; anything else yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::new(text.trim()).ok(),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Self::new(number.to_string()).ok()
            }
            _ => None,
        }
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable name shown to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyDisplayName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Authenticated identity attached to a connection.
///
/// ## Invariants
/// - Constructed only from verified credential claims.
/// - Immutable for the lifetime of the connection it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    display_name: DisplayName,
}

impl Identity {
    /// Pair a user id with its display name.
    pub fn new(user_id: UserId, display_name: DisplayName) -> Self {
        Self {
            user_id,
            display_name,
        }
    }

    /// Identifier of the authenticated user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Display name of the authenticated user.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
}
