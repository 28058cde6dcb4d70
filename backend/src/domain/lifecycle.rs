//! Connection lifecycle: bind, register, dispatch, unregister.
//!
//! The transport calls [`ConnectionLifecycle::connect`] once per upgraded
//! socket, [`ConnectionLifecycle::dispatch`] for each inbound text frame, and
//! [`ConnectionLifecycle::disconnect`] exactly once when the socket ends.
//! Dispatch requires an [`AuthenticatedConnection`], which only `connect`
//! hands out.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::CredentialVerifier;
use crate::domain::{
    AuthError, AuthenticatedConnection, ClientEvent, ConnectionHandle, Credential, EventRouter,
    IdentityBinder, MalformedEvent, PresenceRegistry, RouteOutcome, SignalingRelay,
};

/// Owns the relay's shared services for every connection.
#[derive(Clone)]
pub struct ConnectionLifecycle {
    binder: IdentityBinder,
    registry: Arc<PresenceRegistry>,
    router: EventRouter,
    signaling: SignalingRelay,
}

impl ConnectionLifecycle {
    /// Wire the relay around a credential verifier and a shared registry.
    pub fn new(verifier: Arc<dyn CredentialVerifier>, registry: Arc<PresenceRegistry>) -> Self {
        let router = EventRouter::new(Arc::clone(&registry));
        Self {
            binder: IdentityBinder::new(verifier),
            signaling: SignalingRelay::new(router.clone()),
            router,
            registry,
        }
    }

    /// The registry shared by every connection.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Bind the credential and register the connection for presence.
    ///
    /// # Errors
    /// Returns [`AuthError`] when the credential is missing or invalid, or
    /// when the handle is already registered under another user. The
    /// connection is not registered and the caller must close it after
    /// notifying the client.
    pub async fn connect(
        &self,
        credential: Option<&Credential>,
        handle: ConnectionHandle,
    ) -> Result<AuthenticatedConnection, AuthError> {
        let connection_id = handle.id();
        let identity = self.binder.bind(credential).await.inspect_err(|error| {
            warn!(connection_id = %connection_id, error = %error, "handshake rejected");
        })?;

        self.registry
            .register(identity.user_id(), handle.clone())
            .inspect_err(|error| {
                warn!(connection_id = %connection_id, error = %error, "registration refused");
            })?;
        info!(
            user_id = %identity.user_id(),
            connection_id = %connection_id,
            "user connected"
        );
        Ok(AuthenticatedConnection::new(identity, handle))
    }

    /// Parse one inbound text frame and route it.
    ///
    /// # Errors
    /// Returns [`MalformedEvent`]; the caller logs it and keeps the
    /// connection open.
    pub fn dispatch(
        &self,
        connection: &AuthenticatedConnection,
        text: &str,
    ) -> Result<RouteOutcome, MalformedEvent> {
        let sender = connection.identity();
        match ClientEvent::parse(text)? {
            ClientEvent::WebrtcSignal(request) => self.signaling.relay(request, sender),
            event => self.router.route(event, sender),
        }
    }

    /// Remove the connection from presence.
    pub fn disconnect(&self, connection: &AuthenticatedConnection) {
        let user_id = connection.identity().user_id();
        let connection_id = connection.handle().id();
        self.registry.unregister(user_id, connection_id);
        info!(
            user_id = %user_id,
            connection_id = %connection_id,
            still_online = self.registry.is_online(user_id),
            "user disconnected"
        );
    }
}

#[cfg(test)]
mod tests {
    //! Lifecycle wiring.
    use super::*;
    use crate::domain::ports::{CredentialVerifierError, MockCredentialVerifier, VerifiedClaims};
    use crate::domain::UserId;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn lifecycle() -> ConnectionLifecycle {
        let mut verifier = MockCredentialVerifier::new();
        verifier.expect_verify().returning(|credential| {
            match credential.token().split_once(':') {
                Some((id, name)) => Ok(VerifiedClaims {
                    user_id: id.to_owned(),
                    username: name.to_owned(),
                }),
                None => Err(CredentialVerifierError::malformed("expected id:name")),
            }
        });
        ConnectionLifecycle::new(Arc::new(verifier), Arc::new(PresenceRegistry::new()))
    }

    fn credential(token: &str) -> Credential {
        Credential::new(token).expect("token present")
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_handshake_is_never_registered(lifecycle: ConnectionLifecycle) {
        let (handle, _rx) = ConnectionHandle::channel(4);
        let missing = lifecycle.connect(None, handle.clone()).await;
        let invalid = lifecycle.connect(Some(&credential("garbage")), handle).await;

        assert_eq!(missing.expect_err("no token"), AuthError::MissingCredential);
        assert!(matches!(invalid, Err(AuthError::InvalidCredential { .. })));
        assert_eq!(lifecycle.registry().connection_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn a_handle_cannot_be_bound_to_a_second_user(lifecycle: ConnectionLifecycle) {
        let (handle, _rx) = ConnectionHandle::channel(4);
        let alice = lifecycle
            .connect(Some(&credential("1:alice")), handle.clone())
            .await
            .expect("alice binds");
        let second = lifecycle.connect(Some(&credential("2:bob")), handle).await;

        assert_eq!(second.expect_err("already bound"), AuthError::AlreadyBound);
        assert!(!lifecycle.registry().is_online(&UserId::new("2").expect("id")));
        assert_eq!(
            lifecycle.registry().owner_of(alice.handle().id()).as_ref(),
            Some(alice.identity().user_id())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn connect_dispatch_disconnect(lifecycle: ConnectionLifecycle) {
        let (alice_handle, _alice_rx) = ConnectionHandle::channel(4);
        let (bob_handle, mut bob_rx) = ConnectionHandle::channel(4);
        let alice = lifecycle
            .connect(Some(&credential("1:alice")), alice_handle)
            .await
            .expect("alice binds");
        let bob = lifecycle
            .connect(Some(&credential("2:bob")), bob_handle)
            .await
            .expect("bob binds");

        let frame = json!({"event": "message", "data": {"to": 2, "text": "hi", "from": "2"}});
        let outcome = lifecycle
            .dispatch(&alice, &frame.to_string())
            .expect("routed");
        assert_eq!(
            outcome,
            RouteOutcome::Delivered {
                connections: 1,
                failed: 0
            }
        );
        let delivered: Value =
            serde_json::from_str(&bob_rx.recv().await.expect("frame")).expect("json");
        assert_eq!(
            delivered,
            json!({"event": "message", "data": {"from": "1", "fromUsername": "alice", "text": "hi"}})
        );

        lifecycle.disconnect(&bob);
        assert!(!lifecycle.registry().is_online(bob.identity().user_id()));
        let offline = lifecycle
            .dispatch(&alice, &frame.to_string())
            .expect("routed");
        assert_eq!(offline, RouteOutcome::RecipientOffline);
    }

    #[rstest]
    #[tokio::test]
    async fn signals_go_through_the_signaling_relay(lifecycle: ConnectionLifecycle) {
        let (alice_handle, _alice_rx) = ConnectionHandle::channel(4);
        let (bob_handle, _bob_rx) = ConnectionHandle::channel(4);
        let alice = lifecycle
            .connect(Some(&credential("1:alice")), alice_handle)
            .await
            .expect("alice binds");
        lifecycle
            .connect(Some(&credential("2:bob")), bob_handle)
            .await
            .expect("bob binds");

        let empty = json!({"event": "webrtc-signal", "data": {"to": "2", "signal": {}}});
        let err = lifecycle
            .dispatch(&alice, &empty.to_string())
            .expect_err("empty signal");
        assert!(matches!(err, MalformedEvent::MissingField { field: "signal", .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn one_user_may_hold_many_connections(lifecycle: ConnectionLifecycle) {
        let mut connections = Vec::new();
        for _ in 0..3 {
            let (handle, rx) = ConnectionHandle::channel(4);
            let connection = lifecycle
                .connect(Some(&credential("1:alice")), handle)
                .await
                .expect("binds");
            connections.push((connection, rx));
        }
        let user_id = connections[0].0.identity().user_id().clone();
        assert_eq!(lifecycle.registry().lookup(&user_id).len(), 3);

        let (first, _) = connections.remove(0);
        lifecycle.disconnect(&first);
        assert_eq!(lifecycle.registry().lookup(&user_id).len(), 2);
    }
}
