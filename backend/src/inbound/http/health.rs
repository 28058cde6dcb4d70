//! Relay status probes.
//!
//! `/health/live` answers 200 until the relay starts draining.
//! `/health/ready` answers 200 only while upgrades are being accepted and
//! reports current presence figures read from the shared registry, so an
//! operator can see load without opening a socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;

use crate::domain::PresenceRegistry;

/// Where the relay is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayPhase {
    /// Listener not bound yet.
    Starting,
    /// Upgrades are accepted.
    Accepting,
    /// Shutting down; no new connections.
    Draining,
}

impl RelayPhase {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Accepting => 1,
            Self::Draining => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Accepting,
            _ => Self::Draining,
        }
    }
}

/// Body returned by the readiness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReport {
    /// Current phase.
    pub status: RelayPhase,
    /// Users with at least one live connection.
    pub online_users: usize,
    /// Live connections across all users.
    pub connections: usize,
}

/// Shared status read by the probes.
#[derive(Debug)]
pub struct RelayStatus {
    phase: AtomicU8,
    registry: Arc<PresenceRegistry>,
}

impl RelayStatus {
    /// Start in [`RelayPhase::Starting`], reporting on `registry`.
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self {
            phase: AtomicU8::new(RelayPhase::Starting.to_raw()),
            registry,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RelayPhase {
        RelayPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// The listener is bound and upgrades are accepted.
    pub fn mark_accepting(&self) {
        self.phase
            .store(RelayPhase::Accepting.to_raw(), Ordering::Release);
    }

    /// The server loop has ended. Terminal.
    pub fn mark_draining(&self) {
        self.phase
            .store(RelayPhase::Draining.to_raw(), Ordering::Release);
    }

    /// Snapshot of phase and presence figures.
    pub fn report(&self) -> RelayReport {
        RelayReport {
            status: self.phase(),
            online_users: self.registry.online_users(),
            connections: self.registry.connection_count(),
        }
    }
}

/// Readiness probe: 200 with a [`RelayReport`] while accepting, 503 otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<RelayStatus>) -> HttpResponse {
    let report = state.report();
    let mut response = if report.status == RelayPhase::Accepting {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(report)
}

/// Liveness probe: 200 until draining.
#[get("/health/live")]
pub async fn live(state: web::Data<RelayStatus>) -> HttpResponse {
    let mut response = if state.phase() == RelayPhase::Draining {
        HttpResponse::ServiceUnavailable()
    } else {
        HttpResponse::Ok()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}
