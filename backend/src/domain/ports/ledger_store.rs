//! Driven port for a party's local ledger.
//!
//! Each party keeps its own ledger; there is no server-side copy. The
//! transaction handshake only appends confirmed entries and reads balances.

use async_trait::async_trait;

use crate::domain::{TransactionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger store adapters.
    pub enum LedgerStoreError {
        /// Backing store could not be reached.
        Unavailable { message: String } => "ledger store unavailable: {message}",
        /// The write was refused or could not be completed.
        Write { message: String } => "ledger write failed: {message}",
        /// The balance does not fit in an `i64`.
        Overflow { counterparty: String, entries: usize } =>
            "balance with {counterparty} overflows after {entries} entries",
    }
}

/// A signed ledger row recorded by one party.
///
/// Positive values mean the counterparty owes the recording party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Correlation id shared by both parties' rows.
    pub transaction_id: TransactionId,
    /// Signed value from the recording party's point of view.
    pub signed_value: i64,
    /// The other party of the transaction.
    pub counterparty: UserId,
}

/// Port for appending to and summarising a local ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append a confirmed entry.
    async fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerStoreError>;

    /// Sum every recorded value against the given counterparty.
    async fn sum_by_counterparty(&self, counterparty: &UserId) -> Result<i64, LedgerStoreError>;
}
