//! WebSocket inbound adapter bridging relay events to client sockets.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - pick up the bearer credential from the handshake
//! - spawn the per-connection session loop
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::error;

mod credential;
mod origin;
mod session;

pub mod state;

pub use credential::extract_credential;
pub use origin::AllowedOrigins;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    state.origins.validate(req.headers())?;

    let credential = extract_credential(&req);
    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    actix_web::rt::spawn(session::handle_ws_session(
        state.lifecycle.clone(),
        credential,
        state.timing,
        state.send_queue_capacity,
        session,
        messages,
    ));
    Ok(response)
}
