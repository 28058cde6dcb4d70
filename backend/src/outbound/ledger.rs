//! Process-local ledger store.
//!
//! Rows live for the lifetime of the store. Each party owns one store, so a
//! transaction id appears at most once; a second append for the same id is
//! refused.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::UserId;
use crate::domain::ports::{LedgerEntry, LedgerStore, LedgerStoreError};

/// In-memory [`LedgerStore`] used by embedded clients and tests.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded row in append order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerStoreError> {
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|existing| existing.transaction_id == entry.transaction_id)
        {
            return Err(LedgerStoreError::write(format!(
                "transaction {} already recorded",
                entry.transaction_id
            )));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn sum_by_counterparty(&self, counterparty: &UserId) -> Result<i64, LedgerStoreError> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|entry| &entry.counterparty == counterparty)
            .enumerate()
            .try_fold(0_i64, |balance, (index, entry)| {
                balance
                    .checked_add(entry.signed_value)
                    .ok_or_else(|| LedgerStoreError::overflow(counterparty.as_str(), index + 1))
            })
    }
}
