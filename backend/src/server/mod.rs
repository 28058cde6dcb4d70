//! Server construction and route wiring.

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing::info;

use presence_relay::domain::{ConnectionLifecycle, PresenceRegistry};
use presence_relay::inbound::http::health::{RelayStatus, live, ready};
use presence_relay::inbound::ws;
use presence_relay::inbound::ws::AllowedOrigins;
use presence_relay::inbound::ws::state::{SessionTiming, WsState};
use presence_relay::outbound::JwtCredentialVerifier;
use presence_relay::settings::RelayConfig;

#[derive(Clone)]
struct AppDependencies {
    relay_status: web::Data<RelayStatus>,
    ws_state: web::Data<WsState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        relay_status,
        ws_state,
    } = deps;

    App::new()
        .app_data(relay_status)
        .app_data(ws_state)
        .service(ws::ws_entry)
        .service(ready)
        .service(live)
}

fn build_ws_state(config: &RelayConfig, registry: Arc<PresenceRegistry>) -> WsState {
    let verifier = Arc::new(JwtCredentialVerifier::new(config.jwt_secret.as_bytes()));
    let lifecycle = ConnectionLifecycle::new(verifier, registry);
    WsState::new(lifecycle)
        .with_origins(AllowedOrigins::new(config.allowed_origins.iter().cloned()))
        .with_timing(SessionTiming {
            heartbeat_interval: config.heartbeat_interval,
            client_timeout: config.client_timeout,
        })
        .with_send_queue_capacity(config.send_queue_capacity)
}

/// Construct the relay's HTTP server from validated configuration.
///
/// The probes in `relay_status` and the WebSocket sessions share `registry`.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    relay_status: web::Data<RelayStatus>,
    registry: Arc<PresenceRegistry>,
    config: &RelayConfig,
) -> std::io::Result<Server> {
    let server_relay_status = relay_status.clone();
    let ws_state = web::Data::new(build_ws_state(config, registry));
    if ws_state.origins.is_open() {
        info!("no origin allow-list configured; accepting any Origin");
    }

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            relay_status: server_relay_status.clone(),
            ws_state: ws_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    relay_status.mark_accepting();
    info!(bind_addr = %config.bind_addr, "relay listening");
    Ok(server)
}
