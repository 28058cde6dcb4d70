//! Two-party transaction handshake.
//!
//! One [`TransactionHandshake`] belongs to one party. Local actions return the
//! [`ClientEvent`] to emit through the relay; frames arriving from the relay
//! are fed to [`TransactionHandshake::receive`]. Every transaction id has a
//! stored [`TransactionRecord`] and once that record reaches a terminal state
//! nothing can move it again, so duplicate or late events are no-ops.
//!
//! Ledger rows are written only on locally observed confirmation: by the
//! counterparty when it confirms, and by the initiator when the confirmation
//! arrives. A failed ledger write leaves the record in its prior state.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{LedgerEntry, LedgerStore, LedgerStoreError};
use crate::domain::{
    Amount, CancellationStatus, ClientEvent, ServerEvent, TransactionCancelledDelivered,
    TransactionCancelledPayload, TransactionConfirmedDelivered, TransactionConfirmedPayload,
    TransactionId, TransactionKind, TransactionRequestDelivered, TransactionRequestPayload,
    TransactionState, UserId,
};

/// Which side of a transaction the local party is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Emitted the request.
    Initiator,
    /// Received the request.
    Counterparty,
}

/// Stored fact about one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Owe, pay, or claim; fixes the sign of each side's ledger value.
    pub kind: TransactionKind,
    /// Unsigned amount agreed in the request.
    pub amount: Amount,
    /// The other party.
    pub counterparty: UserId,
    /// Side the local party is on.
    pub role: Role,
    /// Local progress; terminal states never change again.
    pub state: TransactionState,
}

impl TransactionRecord {
    /// Value this party writes to its own ledger on confirmation.
    pub fn local_value(&self) -> i64 {
        match self.role {
            Role::Initiator => self.kind.initiator_value(self.amount),
            Role::Counterparty => self.kind.counterparty_value(self.amount),
        }
    }
}

/// Errors raised by local handshake actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// A request reused an id already in the book.
    #[error("transaction {0} already exists")]
    Duplicate(TransactionId),
    /// No record exists for the id.
    #[error("transaction {0} is unknown")]
    UnknownTransaction(TransactionId),
    /// The transaction already reached a terminal state.
    #[error("transaction {transaction_id} is already {state:?}")]
    AlreadySettled {
        /// Transaction acted on.
        transaction_id: TransactionId,
        /// Terminal state it holds.
        state: TransactionState,
    },
    /// The action belongs to the other side, such as an initiator confirming.
    #[error("transaction {transaction_id} cannot be {action} by the {role:?}")]
    WrongRole {
        /// Transaction acted on.
        transaction_id: TransactionId,
        /// Attempted action, e.g. `confirmed`.
        action: &'static str,
        /// Local party's role.
        role: Role,
    },
    /// Initiator and counterparty are the same user.
    #[error("cannot open a transaction with yourself")]
    SelfTransaction,
    /// The ledger refused the write; the transaction keeps its prior state.
    #[error("ledger write failed: {0}")]
    LedgerWriteFailure(#[from] LedgerStoreError),
}

/// Effect of an inbound frame on the local book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeUpdate {
    /// A new incoming request is now pending locally.
    Requested(TransactionId),
    /// A pending transaction reached a terminal state.
    Settled {
        transaction_id: TransactionId,
        state: TransactionState,
    },
    /// The frame was unrelated, duplicate, or late.
    Ignored,
}

/// Per-party transaction state machine over a local ledger.
pub struct TransactionHandshake {
    owner: UserId,
    ledger: Arc<dyn LedgerStore>,
    book: Mutex<HashMap<TransactionId, TransactionRecord>>,
}

impl TransactionHandshake {
    /// Create an empty book for `owner`.
    pub fn new(owner: UserId, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            owner,
            ledger,
            book: Mutex::new(HashMap::new()),
        }
    }

    /// The party this book belongs to.
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Open a transaction and return the `transaction-request` to emit.
    ///
    /// Only a pending marker is stored; the ledger is untouched until the
    /// counterparty confirms.
    ///
    /// # Errors
    /// [`HandshakeError::Duplicate`] for a known id and
    /// [`HandshakeError::SelfTransaction`] when `counterparty` is the owner.
    pub async fn request(
        &self,
        transaction_id: TransactionId,
        kind: TransactionKind,
        amount: Amount,
        counterparty: UserId,
    ) -> Result<ClientEvent, HandshakeError> {
        if counterparty == self.owner {
            return Err(HandshakeError::SelfTransaction);
        }
        let mut book = self.book.lock().await;
        if book.contains_key(&transaction_id) {
            return Err(HandshakeError::Duplicate(transaction_id));
        }
        let record = TransactionRecord {
            kind,
            amount,
            counterparty: counterparty.clone(),
            role: Role::Initiator,
            state: TransactionState::Pending,
        };
        let sender_value = record.local_value();
        book.insert(transaction_id.clone(), record);
        info!(transaction_id = %transaction_id, %kind, %amount, "transaction requested");

        Ok(ClientEvent::TransactionRequest(TransactionRequestPayload {
            transaction_id: Some(transaction_id),
            kind: Some(kind),
            amount: Some(amount),
            receiver_uid: Some(counterparty),
            sender_value: Some(sender_value),
        }))
    }

    /// Accept an incoming request, write the local ledger row, and return the
    /// `transaction-confirmed` to emit.
    ///
    /// # Errors
    /// [`HandshakeError::LedgerWriteFailure`] leaves the transaction pending.
    pub async fn confirm(&self, transaction_id: &TransactionId) -> Result<ClientEvent, HandshakeError> {
        let mut book = self.book.lock().await;
        let record = pending_record(&mut book, transaction_id, Role::Counterparty, "confirmed")?;

        self.append(transaction_id, record).await?;
        record.state = TransactionState::Confirmed;
        info!(transaction_id = %transaction_id, "transaction confirmed");

        Ok(ClientEvent::TransactionConfirmed(TransactionConfirmedPayload {
            transaction_id: Some(transaction_id.clone()),
            kind: Some(record.kind),
            amount: Some(record.amount),
            to: Some(record.counterparty.clone()),
        }))
    }

    /// Refuse an incoming request.
    ///
    /// # Errors
    /// See [`HandshakeError`]; no ledger row is ever written.
    pub async fn decline(&self, transaction_id: &TransactionId) -> Result<ClientEvent, HandshakeError> {
        self.settle_locally(transaction_id, Role::Counterparty, CancellationStatus::Declined)
            .await
    }

    /// Withdraw an outgoing request.
    ///
    /// # Errors
    /// See [`HandshakeError`]; no ledger row is ever written.
    pub async fn cancel(&self, transaction_id: &TransactionId) -> Result<ClientEvent, HandshakeError> {
        self.settle_locally(transaction_id, Role::Initiator, CancellationStatus::Cancelled)
            .await
    }

    async fn settle_locally(
        &self,
        transaction_id: &TransactionId,
        role: Role,
        status: CancellationStatus,
    ) -> Result<ClientEvent, HandshakeError> {
        let action = match status {
            CancellationStatus::Cancelled => "cancelled",
            CancellationStatus::Declined => "declined",
        };
        let mut book = self.book.lock().await;
        let record = pending_record(&mut book, transaction_id, role, action)?;
        record.state = status.into();
        info!(transaction_id = %transaction_id, status = action, "transaction settled locally");

        Ok(ClientEvent::TransactionCancelled(TransactionCancelledPayload {
            transaction_id: Some(transaction_id.clone()),
            to: Some(record.counterparty.clone()),
            kind: Some(record.kind),
            amount: Some(record.amount),
            status: Some(status),
        }))
    }

    /// Apply a frame delivered by the relay.
    ///
    /// Frames for unknown or settled transactions, or from anyone but the
    /// recorded counterparty, are ignored.
    ///
    /// # Errors
    /// [`HandshakeError::LedgerWriteFailure`] when recording an arriving
    /// confirmation fails; the transaction stays pending.
    pub async fn receive(&self, event: &ServerEvent) -> Result<HandshakeUpdate, HandshakeError> {
        match event {
            ServerEvent::TransactionRequest(request) => Ok(self.on_request(request).await),
            ServerEvent::TransactionConfirmed(confirmed) => self.on_confirmed(confirmed).await,
            ServerEvent::TransactionCancelled(cancelled) => Ok(self.on_cancelled(cancelled).await),
            _ => Ok(HandshakeUpdate::Ignored),
        }
    }

    async fn on_request(&self, request: &TransactionRequestDelivered) -> HandshakeUpdate {
        if request.sender_uid == self.owner {
            return HandshakeUpdate::Ignored;
        }
        let mut book = self.book.lock().await;
        if book.contains_key(&request.transaction_id) {
            debug!(transaction_id = %request.transaction_id, "duplicate request ignored");
            return HandshakeUpdate::Ignored;
        }
        book.insert(
            request.transaction_id.clone(),
            TransactionRecord {
                kind: request.kind,
                amount: request.amount,
                counterparty: request.sender_uid.clone(),
                role: Role::Counterparty,
                state: TransactionState::Pending,
            },
        );
        info!(
            transaction_id = %request.transaction_id,
            from = %request.sender_uid,
            "incoming transaction request"
        );
        HandshakeUpdate::Requested(request.transaction_id.clone())
    }

    async fn on_confirmed(
        &self,
        confirmed: &TransactionConfirmedDelivered,
    ) -> Result<HandshakeUpdate, HandshakeError> {
        let transaction_id = &confirmed.transaction_id;
        let mut book = self.book.lock().await;
        let Some(record) = book.get_mut(transaction_id) else {
            return Ok(HandshakeUpdate::Ignored);
        };
        if record.role != Role::Initiator
            || record.state.is_terminal()
            || record.counterparty != confirmed.sender_uid
        {
            debug!(transaction_id = %transaction_id, state = ?record.state, "confirmation ignored");
            return Ok(HandshakeUpdate::Ignored);
        }

        self.append(transaction_id, record).await?;
        record.state = TransactionState::Confirmed;
        info!(transaction_id = %transaction_id, "transaction confirmed by counterparty");
        Ok(HandshakeUpdate::Settled {
            transaction_id: transaction_id.clone(),
            state: TransactionState::Confirmed,
        })
    }

    async fn on_cancelled(&self, cancelled: &TransactionCancelledDelivered) -> HandshakeUpdate {
        let transaction_id = &cancelled.transaction_id;
        let mut book = self.book.lock().await;
        let Some(record) = book.get_mut(transaction_id) else {
            return HandshakeUpdate::Ignored;
        };
        if record.state.is_terminal() {
            debug!(transaction_id = %transaction_id, state = ?record.state, "late cancellation ignored");
            return HandshakeUpdate::Ignored;
        }
        let state = cancelled.status.map_or_else(
            || match record.role {
                Role::Initiator => TransactionState::Declined,
                Role::Counterparty => TransactionState::Cancelled,
            },
            TransactionState::from,
        );
        record.state = state;
        info!(transaction_id = %transaction_id, ?state, "transaction settled by counterparty");
        HandshakeUpdate::Settled {
            transaction_id: transaction_id.clone(),
            state,
        }
    }

    async fn append(
        &self,
        transaction_id: &TransactionId,
        record: &TransactionRecord,
    ) -> Result<(), HandshakeError> {
        let entry = LedgerEntry {
            transaction_id: transaction_id.clone(),
            signed_value: record.local_value(),
            counterparty: record.counterparty.clone(),
        };
        self.ledger.append(&entry).await.map_err(|error| {
            warn!(transaction_id = %transaction_id, error = %error, "ledger write failed");
            HandshakeError::from(error)
        })
    }

    /// Current state of a transaction, if known.
    pub async fn state(&self, transaction_id: &TransactionId) -> Option<TransactionState> {
        self.book
            .lock()
            .await
            .get(transaction_id)
            .map(|record| record.state)
    }

    /// Snapshot of a transaction's record.
    pub async fn record(&self, transaction_id: &TransactionId) -> Option<TransactionRecord> {
        self.book.lock().await.get(transaction_id).cloned()
    }

    /// Ids of transactions still awaiting an outcome.
    pub async fn pending(&self) -> Vec<TransactionId> {
        self.book
            .lock()
            .await
            .iter()
            .filter(|(_, record)| record.state == TransactionState::Pending)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Net ledger balance against `counterparty`.
    ///
    /// # Errors
    /// Propagates [`LedgerStoreError`] from the store.
    pub async fn balance_with(&self, counterparty: &UserId) -> Result<i64, LedgerStoreError> {
        self.ledger.sum_by_counterparty(counterparty).await
    }
}

fn pending_record<'a>(
    book: &'a mut HashMap<TransactionId, TransactionRecord>,
    transaction_id: &TransactionId,
    role: Role,
    action: &'static str,
) -> Result<&'a mut TransactionRecord, HandshakeError> {
    let record = book
        .get_mut(transaction_id)
        .ok_or_else(|| HandshakeError::UnknownTransaction(transaction_id.clone()))?;
    if record.state.is_terminal() {
        return Err(HandshakeError::AlreadySettled {
            transaction_id: transaction_id.clone(),
            state: record.state,
        });
    }
    if record.role != role {
        return Err(HandshakeError::WrongRole {
            transaction_id: transaction_id.clone(),
            action,
            role: record.role,
        });
    }
    Ok(record)
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
