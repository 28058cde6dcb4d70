//! Transaction primitives shared by the relay and the handshake.
//!
//! Transactions are never stored by the relay. They exist as correlated
//! events plus one ledger row per party, keyed by [`TransactionId`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for transaction primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionValidationError {
    /// Transaction id was empty once trimmed.
    #[error("transaction id must not be empty")]
    EmptyId,
    /// Amount was zero or negative.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}

/// Client-generated, globally unique transaction id (a ULID in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Validate and construct a [`TransactionId`].
    pub fn new(id: impl AsRef<str>) -> Result<Self, TransactionValidationError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TransactionValidationError::EmptyId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TransactionId> for String {
    fn from(value: TransactionId) -> Self {
        value.0
    }
}

impl TryFrom<String> for TransactionId {
    type Error = TransactionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Positive transaction amount in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Validate and construct an [`Amount`].
    ///
    /// # Examples
    /// ```
    /// use presence_relay::domain::Amount;
    ///
    /// assert!(Amount::new(0).is_err());
    /// assert_eq!(Amount::new(50).expect("positive").get(), 50);
    /// ```
    pub fn new(value: i64) -> Result<Self, TransactionValidationError> {
        if value <= 0 {
            return Err(TransactionValidationError::NonPositiveAmount(value));
        }
        Ok(Self(value))
    }

    /// The raw amount.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = TransactionValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the initiator asserts about the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// The counterparty owes the initiator.
    Owe,
    /// The initiator paid the counterparty.
    Pay,
    /// The initiator claims the amount from the counterparty.
    Claim,
}

impl TransactionKind {
    /// Value the initiator records in its own ledger.
    ///
    /// | kind  | initiator |
    /// |-------|-----------|
    /// | owe   | +amount   |
    /// | pay   | -amount   |
    /// | claim | +amount   |
    pub fn initiator_value(self, amount: Amount) -> i64 {
        match self {
            Self::Owe | Self::Claim => amount.get(),
            Self::Pay => -amount.get(),
        }
    }

    /// Value the counterparty records: always the initiator's value negated.
    pub fn counterparty_value(self, amount: Amount) -> i64 {
        -self.initiator_value(amount)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owe => "owe",
            Self::Pay => "pay",
            Self::Claim => "claim",
        })
    }
}

/// Status carried by `transaction-cancelled` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationStatus {
    /// Withdrawn by the initiator.
    Cancelled,
    /// Refused by the counterparty.
    Declined,
}

/// Local view of a transaction's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Requested and awaiting the counterparty.
    Pending,
    /// Accepted by the counterparty; both ledgers hold a row.
    Confirmed,
    /// Refused by the counterparty.
    Declined,
    /// Withdrawn by the initiator.
    Cancelled,
}

impl TransactionState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<CancellationStatus> for TransactionState {
    fn from(value: CancellationStatus) -> Self {
        match value {
            CancellationStatus::Cancelled => Self::Cancelled,
            CancellationStatus::Declined => Self::Declined,
        }
    }
}
