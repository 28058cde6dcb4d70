//! Per-connection WebSocket handler.
//!
//! Binds the connection's identity first; a failed handshake gets one
//! `connect_error` frame and a policy close. An authenticated session then
//! multiplexes three sources: the heartbeat ticker, inbound client frames,
//! and the connection's outbound queue, which the router fills. The queue is
//! drained in FIFO order so deliveries reach the socket in routing order.

use std::time::Instant;

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{Instrument, debug, info_span, warn};

use crate::domain::{
    AuthError, AuthenticatedConnection, ConnectErrorNotice, ConnectionHandle, ConnectionLifecycle,
    Credential, OutboundFrame, ServerEvent,
};
use crate::inbound::ws::state::SessionTiming;

pub(super) async fn handle_ws_session(
    lifecycle: ConnectionLifecycle,
    credential: Option<Credential>,
    timing: SessionTiming,
    send_queue_capacity: usize,
    session: Session,
    stream: MessageStream,
) {
    let (handle, outbound) = ConnectionHandle::channel(send_queue_capacity);
    let span = info_span!(
        "connection",
        connection_id = %handle.id(),
        user_id = tracing::field::Empty
    );

    async move {
        let connection = match lifecycle.connect(credential.as_ref(), handle).await {
            Ok(connection) => connection,
            Err(error) => {
                reject(session, &error).await;
                return;
            }
        };
        tracing::Span::current().record("user_id", connection.identity().user_id().as_str());

        let ws_session = WsSession {
            lifecycle: &lifecycle,
            connection: &connection,
            timing,
        };
        ws_session.run(session, stream, outbound).await;
        lifecycle.disconnect(&connection);
    }
    .instrument(span)
    .await;
}

async fn reject(mut session: Session, error: &AuthError) {
    let notice = ServerEvent::ConnectError(ConnectErrorNotice {
        message: error.to_string(),
    });
    match notice.to_frame() {
        Ok(frame) => {
            if let Err(error) = session.text(frame.to_string()).await {
                warn!(error = %error, "Failed to send connect_error");
            }
        }
        Err(error) => warn!(error = %error, "Failed to serialise connect_error"),
    }
    let reason = CloseReason {
        code: CloseCode::Policy,
        description: Some(error.to_string()),
    };
    if let Err(error) = session.close(Some(reason)).await {
        warn!(error = %error, "Failed to close unauthenticated session");
    }
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession<'a> {
    lifecycle: &'a ConnectionLifecycle,
    connection: &'a AuthenticatedConnection,
    timing: SessionTiming,
}

impl WsSession<'_> {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut outbound: mpsc::Receiver<OutboundFrame>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(self.timing.heartbeat_interval);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                frame = outbound.recv() => {
                    self.handle_outbound(&mut session, frame).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > self.timing.client_timeout {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_outbound(
        &self,
        session: &mut Session,
        frame: Option<OutboundFrame>,
    ) -> Result<(), SessionError> {
        let Some(frame) = frame else {
            return Err(SessionError::StreamClosed);
        };
        session
            .text(frame.to_string())
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(text.as_ref());
                Ok(())
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    fn handle_text_message(&self, text: &str) {
        match self.lifecycle.dispatch(self.connection, text) {
            Ok(outcome) => debug!(?outcome, "event routed"),
            Err(error) => warn!(error = %error, "Dropped malformed event"),
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
