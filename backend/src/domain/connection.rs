//! Connection handles and authentication state.
//!
//! A [`ConnectionHandle`] is the relay's reference to a live channel: a
//! unique id plus a bounded outbound queue drained by the transport. The
//! registry stores handles; the transport task owns the channel itself.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::Identity;

/// Serialised frame queued for a single connection.
pub type OutboundFrame = Arc<str>;

/// Unique identifier for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random connection id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-connection delivery failure.
///
/// Never raised to the router's caller; the router logs it and moves on to
/// sibling connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection's outbound queue is full.
    #[error("connection {0} send queue is full")]
    QueueFull(ConnectionId),
    /// The connection has already shut down.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// Cloneable reference to a live connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<OutboundFrame>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving half the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::random(),
                outbound,
            },
            receiver,
        )
    }

    /// Identifier of the connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting for the transport.
    ///
    /// # Errors
    /// Returns [`DeliveryError`] when the queue is full or the receiver is gone.
    pub fn deliver(&self, frame: OutboundFrame) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull(self.id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }

    /// Whether the transport side has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// A connection whose identity has been bound and which is registered for
/// presence.
///
/// Only [`crate::domain::ConnectionLifecycle::connect`] produces values of
/// this type, so protocol handlers that require one cannot run against an
/// unauthenticated channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedConnection {
    identity: Identity,
    handle: ConnectionHandle,
}

impl AuthenticatedConnection {
    pub(crate) fn new(identity: Identity, handle: ConnectionHandle) -> Self {
        Self { identity, handle }
    }

    /// Identity bound at handshake time.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Handle used for deliveries to this connection.
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }
}

/// Authentication state of a transport-level connection.
#[derive(Debug)]
pub enum ConnectionState {
    /// Upgraded but not yet bound to an identity; no protocol traffic allowed.
    Unauthenticated(ConnectionHandle),
    /// Identity bound and registered in presence.
    Authenticated(AuthenticatedConnection),
}

impl ConnectionState {
    /// Identity of the connection, if bound.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Unauthenticated(_) => None,
            Self::Authenticated(connection) => Some(connection.identity()),
        }
    }

    /// Handle regardless of authentication state.
    pub fn handle(&self) -> &ConnectionHandle {
        match self {
            Self::Unauthenticated(handle) => handle,
            Self::Authenticated(connection) => connection.handle(),
        }
    }
}
