//! Event router: validate, enrich, and fan out to every connection of the
//! target user.
//!
//! Delivery is fire-and-forget. The enriched event is serialised once and the
//! same frame is queued on each of the target's connections independently; a
//! failure on one connection is logged and never blocks its siblings. An
//! offline target is not an error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{ClientEvent, Envelope, Identity, MalformedEvent, PresenceRegistry};

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The frame was queued on `connections` of the target's live connections.
    Delivered {
        /// Connections that accepted the frame.
        connections: usize,
        /// Connections whose queue rejected the frame.
        failed: usize,
    },
    /// The target had no live connections; the event was dropped.
    RecipientOffline,
}

/// Routes validated events through the presence registry.
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Arc<PresenceRegistry>,
}

impl EventRouter {
    /// Build a router over the shared registry.
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// Validate `event`, stamp it with `sender`, and deliver it.
    ///
    /// # Errors
    /// Returns [`MalformedEvent`] when the payload fails validation; nothing is
    /// delivered in that case.
    pub fn route(
        &self,
        event: ClientEvent,
        sender: &Identity,
    ) -> Result<RouteOutcome, MalformedEvent> {
        let envelope = event.into_envelope(sender)?;
        Ok(self.fan_out(&envelope))
    }

    /// Deliver an already enriched envelope to every connection of its target.
    pub fn fan_out(&self, envelope: &Envelope) -> RouteOutcome {
        let targets = self.registry.lookup(&envelope.target);
        if targets.is_empty() {
            info!(target_user = %envelope.target, "recipient offline; event dropped");
            return RouteOutcome::RecipientOffline;
        }

        let frame = match envelope.event.to_frame() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, target_user = %envelope.target, "failed to serialise event");
                return RouteOutcome::Delivered {
                    connections: 0,
                    failed: targets.len(),
                };
            }
        };

        let mut connections = 0;
        let mut failed = 0;
        for handle in targets {
            match handle.deliver(Arc::clone(&frame)) {
                Ok(()) => connections += 1,
                Err(error) => {
                    failed += 1;
                    warn!(error = %error, target_user = %envelope.target, "delivery failed");
                }
            }
        }
        debug!(target_user = %envelope.target, connections, failed, "event fanned out");
        RouteOutcome::Delivered {
            connections,
            failed,
        }
    }
}
