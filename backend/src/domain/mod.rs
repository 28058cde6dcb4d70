//! Transport-agnostic relay core.
//!
//! Purpose: bind identities to connections, track presence, and fan typed
//! events out to every live connection of a target user. Nothing here knows
//! about WebSockets or HTTP; adapters live under `inbound` and `outbound`.
//!
//! Public surface:
//! - Identity types (`UserId`, `DisplayName`, `Identity`) and `Credential`.
//! - `PresenceRegistry`: concurrent user id to connection set map.
//! - `EventRouter`, `SignalingRelay`: validated fan-out.
//! - `TransactionHandshake`: per-party owe/pay/claim agreement.
//! - `ConnectionLifecycle`: the entry point used by transports.

mod auth;
mod connection;
mod events;
mod handshake;
mod identity;
mod identity_binder;
mod lifecycle;
pub mod ports;
mod presence;
mod router;
mod signaling;
mod transaction;

pub use self::auth::{AuthError, Credential};
pub use self::connection::{
    AuthenticatedConnection, ConnectionHandle, ConnectionId, ConnectionState, DeliveryError,
    OutboundFrame,
};
pub use self::events::{
    ClientEvent, ConnectErrorNotice, Envelope, EventKind, InventoryDataDelivered,
    InventoryDataRequest, InventoryFetchDelivered, InventoryFetchRequest, MalformedEvent,
    MessageDelivered, MessageRequest, MoneyDelivered, MoneyRequest, OrderCompletedDelivered,
    OrderCompletedRequest, OrdersDelivered, OrdersRequest, ServerEvent, SignalDelivered,
    SignalRequest, TransactionCancelledDelivered, TransactionCancelledPayload,
    TransactionConfirmedDelivered, TransactionConfirmedPayload, TransactionRequestDelivered,
    TransactionRequestPayload,
};
pub use self::handshake::{
    HandshakeError, HandshakeUpdate, Role, TransactionHandshake, TransactionRecord,
};
pub use self::identity::{DisplayName, Identity, IdentityValidationError, UserId};
pub use self::identity_binder::IdentityBinder;
pub use self::lifecycle::ConnectionLifecycle;
pub use self::presence::{PresenceError, PresenceRegistry};
pub use self::router::{EventRouter, RouteOutcome};
pub use self::signaling::{SignalKind, SignalingRelay};
pub use self::transaction::{
    Amount, CancellationStatus, TransactionId, TransactionKind, TransactionState,
    TransactionValidationError,
};
