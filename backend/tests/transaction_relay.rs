//! End-to-end handshake through the relay core: two parties, each with a
//! local ledger, exchange transaction events via `ConnectionLifecycle`.

use std::sync::Arc;

use async_trait::async_trait;
use presence_relay::domain::ports::{
    CredentialVerifier, CredentialVerifierError, LedgerEntry, VerifiedClaims,
};
use presence_relay::domain::{
    Amount, AuthenticatedConnection, ClientEvent, ConnectionHandle, ConnectionLifecycle,
    Credential, HandshakeUpdate, OutboundFrame, PresenceRegistry, RouteOutcome, ServerEvent,
    TransactionHandshake, TransactionId, TransactionKind, TransactionState, UserId,
};
use presence_relay::outbound::InMemoryLedgerStore;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;

/// Accepts tokens of the form `id:username`.
struct ColonVerifier;

#[async_trait]
impl CredentialVerifier for ColonVerifier {
    async fn verify(
        &self,
        credential: &Credential,
    ) -> Result<VerifiedClaims, CredentialVerifierError> {
        let (user_id, username) = credential
            .token()
            .split_once(':')
            .ok_or_else(|| CredentialVerifierError::malformed("expected id:username"))?;
        Ok(VerifiedClaims {
            user_id: user_id.to_owned(),
            username: username.to_owned(),
        })
    }
}

struct Party {
    connection: AuthenticatedConnection,
    inbox: mpsc::Receiver<OutboundFrame>,
    ledger: Arc<InMemoryLedgerStore>,
    book: TransactionHandshake,
}

impl Party {
    async fn join(lifecycle: &ConnectionLifecycle, token: &str) -> Self {
        let (handle, inbox) = ConnectionHandle::channel(16);
        let credential = Credential::new(token).expect("token present");
        let connection = lifecycle
            .connect(Some(&credential), handle)
            .await
            .expect("identity bound");
        let ledger = Arc::new(InMemoryLedgerStore::new());
        let book = TransactionHandshake::new(
            connection.identity().user_id().clone(),
            ledger.clone(),
        );
        Self {
            connection,
            inbox,
            ledger,
            book,
        }
    }

    fn emit(&self, lifecycle: &ConnectionLifecycle, event: &ClientEvent) -> RouteOutcome {
        let text = serde_json::to_string(event).expect("serialise event");
        lifecycle
            .dispatch(&self.connection, &text)
            .expect("event routed")
    }

    async fn take(&mut self) -> ServerEvent {
        let frame = self.inbox.recv().await.expect("frame delivered");
        serde_json::from_str(&frame).expect("server event")
    }

    async fn take_and_apply(&mut self) -> HandshakeUpdate {
        let event = self.take().await;
        self.book.receive(&event).await.expect("frame applied")
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn tx(id: &str) -> TransactionId {
    TransactionId::new(id).expect("valid transaction id")
}

#[fixture]
fn lifecycle() -> ConnectionLifecycle {
    ConnectionLifecycle::new(Arc::new(ColonVerifier), Arc::new(PresenceRegistry::new()))
}

#[rstest]
#[tokio::test]
async fn owe_round_trip_leaves_dual_signed_ledgers(lifecycle: ConnectionLifecycle) {
    let mut alice = Party::join(&lifecycle, "A:alice").await;
    let mut bob = Party::join(&lifecycle, "B:bob").await;

    let request = alice
        .book
        .request(
            tx("T1"),
            TransactionKind::Owe,
            Amount::new(50).expect("positive"),
            user("B"),
        )
        .await
        .expect("request opened");
    alice.emit(&lifecycle, &request);
    assert_eq!(bob.take_and_apply().await, HandshakeUpdate::Requested(tx("T1")));

    let confirm = bob.book.confirm(&tx("T1")).await.expect("confirmed");
    bob.emit(&lifecycle, &confirm);
    let settled = alice.take_and_apply().await;
    assert_eq!(
        settled,
        HandshakeUpdate::Settled {
            transaction_id: tx("T1"),
            state: TransactionState::Confirmed
        }
    );

    assert_eq!(
        alice.ledger.entries().await,
        vec![LedgerEntry {
            transaction_id: tx("T1"),
            signed_value: 50,
            counterparty: user("B"),
        }]
    );
    assert_eq!(
        bob.ledger.entries().await,
        vec![LedgerEntry {
            transaction_id: tx("T1"),
            signed_value: -50,
            counterparty: user("A"),
        }]
    );
    assert_eq!(alice.book.balance_with(&user("B")).await, Ok(50));
    assert_eq!(bob.book.balance_with(&user("A")).await, Ok(-50));

    bob.emit(&lifecycle, &confirm);
    assert_eq!(alice.take_and_apply().await, HandshakeUpdate::Ignored);
    assert_eq!(alice.ledger.entries().await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn cancel_before_confirm_leaves_both_ledgers_empty(lifecycle: ConnectionLifecycle) {
    let mut alice = Party::join(&lifecycle, "A:alice").await;
    let mut bob = Party::join(&lifecycle, "B:bob").await;

    let request = alice
        .book
        .request(
            tx("T2"),
            TransactionKind::Pay,
            Amount::new(20).expect("positive"),
            user("B"),
        )
        .await
        .expect("request opened");
    alice.emit(&lifecycle, &request);
    bob.take_and_apply().await;

    let cancel = alice.book.cancel(&tx("T2")).await.expect("cancelled");
    alice.emit(&lifecycle, &cancel);
    let ServerEvent::TransactionCancelled(delivered) = bob.take().await else {
        panic!("expected transaction-cancelled");
    };
    assert_eq!(
        serde_json::to_value(&delivered).expect("serialise"),
        serde_json::json!({"transactionId": "T2", "type": "pay", "amount": 20, "status": "Cancelled"})
    );
    bob.book
        .receive(&ServerEvent::TransactionCancelled(delivered))
        .await
        .expect("cancel applied");

    assert!(bob.book.confirm(&tx("T2")).await.is_err());
    assert_eq!(bob.book.state(&tx("T2")).await, Some(TransactionState::Cancelled));
    assert!(alice.ledger.entries().await.is_empty());
    assert!(bob.ledger.entries().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn request_to_an_offline_party_is_dropped(lifecycle: ConnectionLifecycle) {
    let alice = Party::join(&lifecycle, "A:alice").await;
    let request = alice
        .book
        .request(
            tx("T3"),
            TransactionKind::Claim,
            Amount::new(5).expect("positive"),
            user("nobody"),
        )
        .await
        .expect("request opened");

    assert_eq!(alice.emit(&lifecycle, &request), RouteOutcome::RecipientOffline);
    assert_eq!(alice.book.state(&tx("T3")).await, Some(TransactionState::Pending));
}
