//! Event parsing, validation, and wire-shape tests.

use super::*;
use crate::domain::DisplayName;
use insta::assert_json_snapshot;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn alice() -> Identity {
    Identity::new(
        UserId::new("alice").expect("valid id"),
        DisplayName::new("Alice").expect("valid name"),
    )
}

fn envelope(frame: Value, sender: &Identity) -> Result<Envelope, MalformedEvent> {
    ClientEvent::parse(&frame.to_string())?.into_envelope(sender)
}

#[rstest]
fn message_is_stamped_with_bound_identity(alice: Identity) {
    let frame = json!({
        "event": "message",
        "data": {"to": "bob", "text": "hi", "from": "mallory", "fromUsername": "Mallory"}
    });
    let envelope = envelope(frame, &alice).expect("valid message");

    assert_eq!(envelope.target.as_str(), "bob");
    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "message",
      "data": {
        "from": "alice",
        "fromUsername": "Alice",
        "text": "hi"
      }
    }
    "#);
}

#[rstest]
fn webrtc_signal_passes_body_through(alice: Identity) {
    let frame = json!({
        "event": "webrtc-signal",
        "data": {"to": 42, "signal": {"type": "offer", "sdp": "v=0"}}
    });
    let envelope = envelope(frame, &alice).expect("valid signal");

    assert_eq!(envelope.target.as_str(), "42");
    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "webrtc-signal",
      "data": {
        "from": "alice",
        "signal": {
          "sdp": "v=0",
          "type": "offer"
        }
      }
    }
    "#);
}

#[rstest]
fn transaction_request_carries_sender_fields(alice: Identity) {
    let frame = json!({
        "event": "transaction-request",
        "data": {
            "transactionId": "T1",
            "type": "owe",
            "amount": 50,
            "receiverUid": "bob",
            "senderValue": 50
        }
    });
    let envelope = envelope(frame, &alice).expect("valid request");

    assert_eq!(envelope.target.as_str(), "bob");
    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "transaction-request",
      "data": {
        "transactionId": "T1",
        "type": "owe",
        "amount": 50,
        "senderUid": "alice",
        "senderUsername": "Alice",
        "senderValue": 50
      }
    }
    "#);
}

#[rstest]
fn transaction_confirmed_names_the_confirming_party(alice: Identity) {
    let frame = json!({
        "event": "transaction-confirmed",
        "data": {"transactionId": "T1", "type": "owe", "amount": 50, "to": "bob"}
    });
    let envelope = envelope(frame, &alice).expect("valid confirmation");

    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "transaction-confirmed",
      "data": {
        "transactionId": "T1",
        "type": "owe",
        "amount": 50,
        "senderUid": "alice"
      }
    }
    "#);
}

#[rstest]
fn transaction_cancelled_keeps_status(alice: Identity) {
    let frame = json!({
        "event": "transaction-cancelled",
        "data": {"transactionId": "T2", "to": "bob", "type": "pay", "amount": 20, "status": "Declined"}
    });
    let envelope = envelope(frame, &alice).expect("valid cancellation");

    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "transaction-cancelled",
      "data": {
        "transactionId": "T2",
        "type": "pay",
        "amount": 20,
        "status": "Declined"
      }
    }
    "#);
}

#[rstest]
#[case(json!({"event": "fetch-inventory", "data": {"sellerUid": "shop"}}))]
#[case(json!({"event": "inventory-fetch", "data": {"sellerUid": "shop"}}))]
fn inventory_fetch_accepts_both_names(alice: Identity, #[case] frame: Value) {
    let envelope = envelope(frame, &alice).expect("valid fetch");
    assert_eq!(envelope.target.as_str(), "shop");
    assert_eq!(
        envelope.event,
        ServerEvent::InventoryFetch(InventoryFetchDelivered {
            from: alice.user_id().clone()
        })
    );
}

#[rstest]
fn orders_keep_their_delivery_shape(alice: Identity) {
    let frame = json!({
        "event": "orders",
        "data": {
            "to": "shop",
            "orderId": "O-1",
            "customerUid": "alice",
            "customerUsername": "Alice",
            "items": [{"sku": "tea", "qty": 2}],
            "totalPrice": 9
        }
    });
    let envelope = envelope(frame, &alice).expect("valid order");

    assert_json_snapshot!(envelope.event, @r#"
    {
      "event": "orders",
      "data": {
        "orderId": "O-1",
        "customerUid": "alice",
        "customerUsername": "Alice",
        "items": [
          {
            "qty": 2,
            "sku": "tea"
          }
        ],
        "totalPrice": 9
      }
    }
    "#);
}

#[rstest]
#[case(json!({"event": "message", "data": {"to": "bob"}}), EventKind::Message, "text")]
#[case(json!({"event": "message", "data": {"to": "bob", "text": ""}}), EventKind::Message, "text")]
#[case(json!({"event": "message", "data": {"text": "hi"}}), EventKind::Message, "to")]
#[case(json!({"event": "webrtc-signal", "data": {"to": "bob", "signal": {}}}), EventKind::WebrtcSignal, "signal")]
#[case(json!({"event": "webrtc-signal", "data": {"to": "bob", "signal": "offer"}}), EventKind::WebrtcSignal, "signal")]
#[case(json!({"event": "money", "data": {"to": "bob", "amount": 0}}), EventKind::Money, "amount")]
#[case(json!({"event": "orders", "data": {"to": "shop", "orderId": "O-1"}}), EventKind::Orders, "items")]
#[case(json!({"event": "fetch-inventory", "data": {}}), EventKind::InventoryFetch, "sellerUid")]
#[case(json!({"event": "inventory-data", "data": {"to": "bob"}}), EventKind::InventoryData, "inventory")]
#[case(json!({"event": "order-completed", "data": {"to": "bob"}}), EventKind::OrderCompleted, "orderId")]
#[case(json!({"event": "transaction-request", "data": {"transactionId": "T", "type": "owe", "amount": 5}}), EventKind::TransactionRequest, "receiverUid")]
#[case(json!({"event": "transaction-request", "data": {"transactionId": "T", "receiverUid": "bob", "amount": 5}}), EventKind::TransactionRequest, "type")]
#[case(json!({"event": "transaction-confirmed", "data": {"to": "bob"}}), EventKind::TransactionConfirmed, "transactionId")]
#[case(json!({"event": "transaction-cancelled", "data": {"transactionId": "T"}}), EventKind::TransactionCancelled, "to")]
fn missing_required_fields_are_malformed(
    alice: Identity,
    #[case] frame: Value,
    #[case] event: EventKind,
    #[case] field: &'static str,
) {
    let err = envelope(frame, &alice).expect_err("payload must be rejected");
    assert_eq!(err, MalformedEvent::MissingField { event, field });
}

#[rstest]
#[case("not json")]
#[case(r#"{"event": "teleport", "data": {}}"#)]
#[case(r#"{"event": "transaction-request", "data": {"transactionId": "T", "amount": -3}}"#)]
#[case(r#"{"event": "transaction-request", "data": {"transactionId": "T", "type": "gift"}}"#)]
#[case(r#"{"event": "message", "data": {"to": "bob", "text": 7}}"#)]
fn unparseable_frames_are_malformed(#[case] text: &str) {
    let err = ClientEvent::parse(text).expect_err("frame must be rejected");
    assert!(matches!(err, MalformedEvent::Unparseable { .. }));
}

#[test]
fn client_events_serialise_with_wire_names() {
    let event = ClientEvent::TransactionConfirmed(TransactionConfirmedPayload {
        transaction_id: Some(TransactionId::new("T1").expect("valid id")),
        kind: Some(TransactionKind::Pay),
        amount: Some(Amount::new(20).expect("positive")),
        to: Some(UserId::new("alice").expect("valid id")),
    });
    let value = serde_json::to_value(&event).expect("serialise");
    assert_eq!(
        value,
        json!({
            "event": "transaction-confirmed",
            "data": {"transactionId": "T1", "type": "pay", "amount": 20, "to": "alice"}
        })
    );
    assert_eq!(
        ClientEvent::parse(&value.to_string()).expect("round trip"),
        event
    );
}
