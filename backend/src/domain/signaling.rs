//! WebRTC signal relay.
//!
//! Offers, answers, and ICE candidates travel as opaque `webrtc-signal`
//! bodies. The relay checks that a target and a non-empty signal object are
//! present and otherwise forwards the body untouched; SDP and candidate
//! contents are never inspected.

use serde_json::Value;
use tracing::debug;

use crate::domain::{ClientEvent, EventRouter, Identity, MalformedEvent, RouteOutcome, SignalRequest};

/// Coarse classification of a signal body, used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SDP offer.
    Offer,
    /// SDP answer.
    Answer,
    /// ICE candidate.
    Candidate,
    /// Anything else; still relayed.
    Other,
}

impl SignalKind {
    /// Classify a signal body by its `type` field or a `candidate` member.
    pub fn classify(signal: &Value) -> Self {
        match signal.get("type").and_then(Value::as_str) {
            Some("offer") => Self::Offer,
            Some("answer") => Self::Answer,
            Some("candidate") => Self::Candidate,
            _ if signal.get("candidate").is_some() => Self::Candidate,
            _ => Self::Other,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::Other => "other",
        }
    }
}

/// Pass-through relay for `webrtc-signal` events.
#[derive(Debug, Clone)]
pub struct SignalingRelay {
    router: EventRouter,
}

impl SignalingRelay {
    /// Wrap the shared router.
    pub fn new(router: EventRouter) -> Self {
        Self { router }
    }

    /// Forward a signal to every connection of its target.
    ///
    /// # Errors
    /// Returns [`MalformedEvent`] when `to` is missing or `signal` is not a
    /// non-empty object.
    pub fn relay(
        &self,
        request: SignalRequest,
        sender: &Identity,
    ) -> Result<RouteOutcome, MalformedEvent> {
        let kind = request
            .signal
            .as_ref()
            .map_or(SignalKind::Other, SignalKind::classify);
        let outcome = self.router.route(ClientEvent::WebrtcSignal(request), sender)?;
        debug!(
            user_id = %sender.user_id(),
            signal = kind.as_str(),
            ?outcome,
            "signal relayed"
        );
        Ok(outcome)
    }
}
