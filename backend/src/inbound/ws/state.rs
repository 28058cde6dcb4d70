//! Shared WebSocket adapter state.
//!
//! The upgrade handler depends on the domain's `ConnectionLifecycle` rather
//! than constructing services itself, so tests can wire the relay with
//! deterministic verifiers.

use std::time::Duration;

use crate::domain::ConnectionLifecycle;
use crate::inbound::ws::origin::AllowedOrigins;

/// Heartbeat cadence for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Time between server pings.
    pub heartbeat_interval: Duration,
    /// Idle time after which the connection is closed.
    pub client_timeout: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(10),
        }
    }
}

/// Dependency bundle for the WebSocket entry point.
#[derive(Clone)]
pub struct WsState {
    /// Relay services shared by every session.
    pub lifecycle: ConnectionLifecycle,
    /// Origin allow-list checked before the upgrade.
    pub origins: AllowedOrigins,
    /// Heartbeat cadence.
    pub timing: SessionTiming,
    /// Outbound frames buffered per connection.
    pub send_queue_capacity: usize,
}

impl WsState {
    /// Construct state with an open origin policy and default timing.
    pub fn new(lifecycle: ConnectionLifecycle) -> Self {
        Self {
            lifecycle,
            origins: AllowedOrigins::any(),
            timing: SessionTiming::default(),
            send_queue_capacity: 64,
        }
    }

    /// Restrict upgrades to the given origins.
    #[must_use]
    pub fn with_origins(mut self, origins: AllowedOrigins) -> Self {
        self.origins = origins;
        self
    }

    /// Override the heartbeat cadence.
    #[must_use]
    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Override the per-connection outbound queue size.
    #[must_use]
    pub fn with_send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity;
        self
    }
}
