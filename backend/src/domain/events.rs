//! Typed relay events.
//!
//! Frames on the wire are JSON objects of the form
//! `{"event": "<name>", "data": {...}}`. [`ClientEvent`] is the closed set of
//! events a client may emit; [`ServerEvent`] is what the relay delivers.
//! Validation turns a [`ClientEvent`] plus the sender's bound [`Identity`]
//! into an [`Envelope`]: the target user and the enriched event to fan out.
//! Sender fields (`from`, `fromUsername`, `senderUid`, `senderUsername`) are
//! always stamped from the identity, never copied from the payload.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    Amount, CancellationStatus, Identity, OutboundFrame, TransactionId, TransactionKind, UserId,
};

/// Names of routable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Chat text.
    Message,
    /// WebRTC offer, answer, or ICE candidate.
    WebrtcSignal,
    /// Informal money notice.
    Money,
    /// Order placed with a seller.
    Orders,
    /// Request for a seller's inventory.
    InventoryFetch,
    /// Inventory snapshot sent back to a buyer.
    InventoryData,
    /// Order status update.
    OrderCompleted,
    /// Transaction handshake: initiator's request.
    TransactionRequest,
    /// Transaction handshake: counterparty's confirmation.
    TransactionConfirmed,
    /// Transaction handshake: cancellation or decline.
    TransactionCancelled,
}

impl EventKind {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::WebrtcSignal => "webrtc-signal",
            Self::Money => "money",
            Self::Orders => "orders",
            Self::InventoryFetch => "fetch-inventory",
            Self::InventoryData => "inventory-data",
            Self::OrderCompleted => "order-completed",
            Self::TransactionRequest => "transaction-request",
            Self::TransactionConfirmed => "transaction-confirmed",
            Self::TransactionCancelled => "transaction-cancelled",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-event validation failure. The event is dropped; the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    /// The frame is not JSON, names an unknown event, or has mistyped fields.
    #[error("unparseable event frame: {reason}")]
    Unparseable {
        /// Parser message.
        reason: String,
    },
    /// A field the event requires is absent or empty.
    #[error("`{event}` event is missing `{field}`")]
    MissingField {
        /// Event that failed validation.
        event: EventKind,
        /// Wire name of the missing field.
        field: &'static str,
    },
}

impl MalformedEvent {
    fn missing(event: EventKind, field: &'static str) -> Self {
        Self::MissingField { event, field }
    }
}

/// Loose presence check matching what clients treat as "set": not null,
/// not `false`, not an empty string, and not zero.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(is_present)
}

fn user_ref<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(UserId::from_json))
}

fn non_empty_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.is_empty()))
}

/// `message {to, text}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Message body; must be non-empty.
    #[serde(default, deserialize_with = "non_empty_text", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `webrtc-signal {to, signal}`; the signal body is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Opaque SDP or ICE body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<Value>,
}

/// `money {to, amount, description}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoneyRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Amount as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
}

/// `orders {to, orderId, customerUid, customerUsername, items, totalPrice}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Order reference chosen by the buyer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Value>,
    /// Buyer id as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_uid: Option<Value>,
    /// Buyer name as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_username: Option<Value>,
    /// Ordered items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    /// Order total as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Value>,
}

/// `fetch-inventory {sellerUid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFetchRequest {
    /// Seller whose inventory is requested.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub seller_uid: Option<UserId>,
}

/// `inventory-data {to, inventory}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryDataRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Inventory snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Value>,
}

/// `order-completed {to, orderId, status}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletedRequest {
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Order reference chosen by the buyer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Value>,
    /// New order status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// `transaction-request {transactionId, type, amount, receiverUid, senderValue}`.
///
/// `senderValue` is forwarded for display only; receivers derive their own
/// ledger value from `type` and `amount`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequestPayload {
    /// Correlation id shared by both parties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    /// Owe, pay, or claim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Positive whole units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Counterparty user id.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub receiver_uid: Option<UserId>,
    /// Initiator's own signed value; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_value: Option<i64>,
}

/// `transaction-confirmed {transactionId, type, amount, to}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConfirmedPayload {
    /// Correlation id shared by both parties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    /// Owe, pay, or claim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Amount as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
}

/// `transaction-cancelled {transactionId, to, type, amount, status}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCancelledPayload {
    /// Correlation id shared by both parties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    /// Recipient user id; string or number on the wire.
    #[serde(default, deserialize_with = "user_ref", skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    /// Owe, pay, or claim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Amount as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// `Cancelled` from the initiator, `Declined` from the counterparty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CancellationStatus>,
}

/// Closed set of events a client may emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Chat text for one user.
    Message(MessageRequest),
    /// WebRTC negotiation message.
    WebrtcSignal(SignalRequest),
    /// Informal money notice.
    Money(MoneyRequest),
    /// Order placed with a seller.
    Orders(OrdersRequest),
    /// Ask a seller for their inventory.
    #[serde(rename = "fetch-inventory", alias = "inventory-fetch")]
    InventoryFetch(InventoryFetchRequest),
    /// Inventory sent back to a buyer.
    InventoryData(InventoryDataRequest),
    /// Order status update.
    OrderCompleted(OrderCompletedRequest),
    /// Open a transaction with a counterparty.
    TransactionRequest(TransactionRequestPayload),
    /// Accept the counterparty's request.
    TransactionConfirmed(TransactionConfirmedPayload),
    /// Withdraw or decline a transaction.
    TransactionCancelled(TransactionCancelledPayload),
}

impl ClientEvent {
    /// Parse a text frame.
    ///
    /// # Errors
    /// Returns [`MalformedEvent::Unparseable`] for invalid JSON, unknown event
    /// names, or mistyped fields.
    pub fn parse(text: &str) -> Result<Self, MalformedEvent> {
        serde_json::from_str(text).map_err(|error| MalformedEvent::Unparseable {
            reason: error.to_string(),
        })
    }

    /// Name of the event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::WebrtcSignal(_) => EventKind::WebrtcSignal,
            Self::Money(_) => EventKind::Money,
            Self::Orders(_) => EventKind::Orders,
            Self::InventoryFetch(_) => EventKind::InventoryFetch,
            Self::InventoryData(_) => EventKind::InventoryData,
            Self::OrderCompleted(_) => EventKind::OrderCompleted,
            Self::TransactionRequest(_) => EventKind::TransactionRequest,
            Self::TransactionConfirmed(_) => EventKind::TransactionConfirmed,
            Self::TransactionCancelled(_) => EventKind::TransactionCancelled,
        }
    }

    /// Validate the payload and enrich it with the sender's identity.
    ///
    /// # Errors
    /// Returns [`MalformedEvent::MissingField`] when a required field is
    /// absent; nothing is delivered in that case.
    pub fn into_envelope(self, sender: &Identity) -> Result<Envelope, MalformedEvent> {
        let kind = self.kind();
        let require = |field: &'static str| MalformedEvent::missing(kind, field);
        let from = sender.user_id().clone();
        let from_username = sender.display_name().to_string();

        let (target, event) = match self {
            Self::Message(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let text = request.text.ok_or_else(|| require("text"))?;
                let event = ServerEvent::Message(MessageDelivered {
                    from,
                    from_username,
                    text,
                });
                (target, event)
            }
            Self::WebrtcSignal(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let signal = request
                    .signal
                    .filter(|signal| signal.as_object().is_some_and(|body| !body.is_empty()))
                    .ok_or_else(|| require("signal"))?;
                (target, ServerEvent::WebrtcSignal(SignalDelivered { from, signal }))
            }
            Self::Money(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let amount = present(request.amount).ok_or_else(|| require("amount"))?;
                let event = ServerEvent::Money(MoneyDelivered {
                    from,
                    from_username,
                    amount,
                    description: request.description,
                });
                (target, event)
            }
            Self::Orders(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let order_id = present(request.order_id).ok_or_else(|| require("orderId"))?;
                let items = present(request.items).ok_or_else(|| require("items"))?;
                let event = ServerEvent::Orders(OrdersDelivered {
                    order_id,
                    customer_uid: request.customer_uid,
                    customer_username: request.customer_username,
                    items,
                    total_price: request.total_price,
                });
                (target, event)
            }
            Self::InventoryFetch(request) => {
                let target = request.seller_uid.ok_or_else(|| require("sellerUid"))?;
                (
                    target,
                    ServerEvent::InventoryFetch(InventoryFetchDelivered { from }),
                )
            }
            Self::InventoryData(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let inventory = present(request.inventory).ok_or_else(|| require("inventory"))?;
                (
                    target,
                    ServerEvent::InventoryData(InventoryDataDelivered { inventory }),
                )
            }
            Self::OrderCompleted(request) => {
                let target = request.to.ok_or_else(|| require("to"))?;
                let order_id = present(request.order_id).ok_or_else(|| require("orderId"))?;
                let event = ServerEvent::OrderCompleted(OrderCompletedDelivered {
                    order_id,
                    status: request.status,
                });
                (target, event)
            }
            Self::TransactionRequest(request) => {
                let transaction_id = request
                    .transaction_id
                    .ok_or_else(|| require("transactionId"))?;
                let target = request.receiver_uid.ok_or_else(|| require("receiverUid"))?;
                let kind = request.kind.ok_or_else(|| require("type"))?;
                let amount = request.amount.ok_or_else(|| require("amount"))?;
                let event = ServerEvent::TransactionRequest(TransactionRequestDelivered {
                    transaction_id,
                    kind,
                    amount,
                    sender_uid: from,
                    sender_username: from_username,
                    sender_value: request.sender_value,
                });
                (target, event)
            }
            Self::TransactionConfirmed(request) => {
                let transaction_id = request
                    .transaction_id
                    .ok_or_else(|| require("transactionId"))?;
                let target = request.to.ok_or_else(|| require("to"))?;
                let event = ServerEvent::TransactionConfirmed(TransactionConfirmedDelivered {
                    transaction_id,
                    kind: request.kind,
                    amount: request.amount,
                    sender_uid: from,
                });
                (target, event)
            }
            Self::TransactionCancelled(request) => {
                let transaction_id = request
                    .transaction_id
                    .ok_or_else(|| require("transactionId"))?;
                let target = request.to.ok_or_else(|| require("to"))?;
                let event = ServerEvent::TransactionCancelled(TransactionCancelledDelivered {
                    transaction_id,
                    kind: request.kind,
                    amount: request.amount,
                    status: request.status,
                });
                (target, event)
            }
        };

        Ok(Envelope { target, event })
    }
}

/// `message` as delivered: `{from, fromUsername, text}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDelivered {
    /// Sender, stamped from the bound identity.
    pub from: UserId,
    /// Sender's display name.
    pub from_username: String,
    /// Message body; must be non-empty.
    pub text: String,
}

/// `webrtc-signal` as delivered: `{from, signal}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelivered {
    /// Sender, stamped from the bound identity.
    pub from: UserId,
    /// Opaque SDP or ICE body.
    pub signal: Value,
}

/// `money` as delivered: `{from, fromUsername, amount, description}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyDelivered {
    /// Sender, stamped from the bound identity.
    pub from: UserId,
    /// Sender's display name.
    pub from_username: String,
    /// Amount as sent.
    pub amount: Value,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
}

/// `orders` as delivered: `{orderId, customerUid, customerUsername, items, totalPrice}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersDelivered {
    /// Order reference chosen by the buyer.
    pub order_id: Value,
    /// Buyer id as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_uid: Option<Value>,
    /// Buyer name as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_username: Option<Value>,
    /// Ordered items.
    pub items: Value,
    /// Order total as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Value>,
}

/// `fetch-inventory` as delivered to the seller: `{from}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryFetchDelivered {
    /// Sender, stamped from the bound identity.
    pub from: UserId,
}

/// `inventory-data` as delivered: `{inventory}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDataDelivered {
    /// Inventory snapshot.
    pub inventory: Value,
}

/// `order-completed` as delivered: `{orderId, status}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletedDelivered {
    /// Order reference chosen by the buyer.
    pub order_id: Value,
    /// New order status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// `transaction-request` as delivered:
/// `{transactionId, type, amount, senderUid, senderUsername, senderValue}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequestDelivered {
    /// Correlation id shared by both parties.
    pub transaction_id: TransactionId,
    /// Owe, pay, or claim.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Positive whole units.
    pub amount: Amount,
    /// Sender, stamped from the bound identity.
    pub sender_uid: UserId,
    /// Sender's display name.
    pub sender_username: String,
    /// Initiator's own signed value; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_value: Option<i64>,
}

/// `transaction-confirmed` as delivered: `{transactionId, type, amount, senderUid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConfirmedDelivered {
    /// Correlation id shared by both parties.
    pub transaction_id: TransactionId,
    /// Owe, pay, or claim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Amount as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// Sender, stamped from the bound identity.
    pub sender_uid: UserId,
}

/// `transaction-cancelled` as delivered: `{transactionId, type, amount, status}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCancelledDelivered {
    /// Correlation id shared by both parties.
    pub transaction_id: TransactionId,
    /// Owe, pay, or claim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Amount as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// `Cancelled` or `Declined`; absent when the sender omitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CancellationStatus>,
}

/// Sent once before closing a connection whose handshake failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectErrorNotice {
    /// Reason the handshake was refused.
    pub message: String,
}

/// Events the relay delivers to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Chat text from another user.
    Message(MessageDelivered),
    /// Relayed WebRTC negotiation message.
    WebrtcSignal(SignalDelivered),
    /// Money notice.
    Money(MoneyDelivered),
    /// Incoming order.
    Orders(OrdersDelivered),
    /// A buyer wants the inventory.
    #[serde(rename = "fetch-inventory")]
    InventoryFetch(InventoryFetchDelivered),
    /// A seller's inventory.
    InventoryData(InventoryDataDelivered),
    /// Order status update.
    OrderCompleted(OrderCompletedDelivered),
    /// Transaction opened by the sender.
    TransactionRequest(TransactionRequestDelivered),
    /// The counterparty accepted.
    TransactionConfirmed(TransactionConfirmedDelivered),
    /// The other party withdrew or declined.
    TransactionCancelled(TransactionCancelledDelivered),
    /// Authentication failed; the socket closes next.
    #[serde(rename = "connect_error")]
    ConnectError(ConnectErrorNotice),
}

impl ServerEvent {
    /// Serialise into a text frame.
    ///
    /// # Errors
    /// Propagates [`serde_json::Error`]; payloads built by the relay are
    /// always serialisable.
    pub fn to_frame(&self) -> Result<OutboundFrame, serde_json::Error> {
        serde_json::to_string(self).map(Arc::from)
    }
}

/// A validated event ready for fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// User whose connections receive the event.
    pub target: UserId,
    /// Enriched event to deliver.
    pub event: ServerEvent,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
