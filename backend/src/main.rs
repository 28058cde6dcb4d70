//! Relay entry-point: loads settings, wires the WebSocket relay and probes.

mod server;

use std::sync::Arc;

use actix_web::web;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use presence_relay::domain::PresenceRegistry;
use presence_relay::inbound::http::health::RelayStatus;
use presence_relay::settings::RelaySettings;
use server::create_server;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = RelaySettings::load_from_process()
        .and_then(RelaySettings::resolve)
        .map_err(|e| {
            error!(error = %e, "invalid relay configuration");
            std::io::Error::other(e)
        })?;

    let registry = Arc::new(PresenceRegistry::new());
    let relay_status = web::Data::new(RelayStatus::new(Arc::clone(&registry)));
    let server = create_server(relay_status.clone(), registry, &config)?;
    let result = server.await;
    relay_status.mark_draining();
    result
}
