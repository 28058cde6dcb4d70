//! Presence registry tests.

use super::*;
use std::sync::Arc;

use dashmap::DashSet;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;

use crate::domain::OutboundFrame;

#[fixture]
fn registry() -> PresenceRegistry {
    PresenceRegistry::new()
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

fn connection() -> (ConnectionHandle, mpsc::Receiver<OutboundFrame>) {
    ConnectionHandle::channel(8)
}

fn ids(handles: &[ConnectionHandle]) -> Vec<ConnectionId> {
    let mut ids: Vec<_> = handles.iter().map(ConnectionHandle::id).collect();
    ids.sort_by_key(|id| *id.as_uuid());
    ids
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn lookup_returns_every_registered_connection(registry: PresenceRegistry, #[case] count: usize) {
    let alice = user("alice");
    let connections: Vec<_> = (0..count).map(|_| connection()).collect();
    for (handle, _) in &connections {
        registry.register(&alice, handle.clone()).expect("registered");
    }

    let found = registry.lookup(&alice);
    let expected: Vec<_> = connections.iter().map(|(handle, _)| handle.clone()).collect();
    assert_eq!(ids(&found), ids(&expected));

    let (first, _) = &connections[0];
    assert!(registry.unregister(&alice, first.id()));
    assert_eq!(registry.lookup(&alice).len(), count - 1);
}

#[rstest]
fn register_is_idempotent(registry: PresenceRegistry) {
    let alice = user("alice");
    let (handle, _rx) = connection();
    registry.register(&alice, handle.clone()).expect("registered");
    registry.register(&alice, handle).expect("registered");
    assert_eq!(registry.lookup(&alice).len(), 1);
    assert_eq!(registry.connection_count(), 1);
}

#[rstest]
fn last_unregister_removes_the_entry(registry: PresenceRegistry) {
    let alice = user("alice");
    let (handle, _rx) = connection();
    registry.register(&alice, handle.clone()).expect("registered");
    assert!(registry.is_online(&alice));

    assert!(registry.unregister(&alice, handle.id()));
    assert!(!registry.is_online(&alice));
    assert_eq!(registry.online_users(), 0);
    assert!(registry.lookup(&alice).is_empty());
}

#[rstest]
fn unregister_of_unknown_connection_is_harmless(registry: PresenceRegistry) {
    let alice = user("alice");
    let (kept, _rx_kept) = connection();
    let (stranger, _rx_stranger) = connection();
    registry.register(&alice, kept.clone()).expect("registered");

    assert!(!registry.unregister(&alice, stranger.id()));
    assert!(!registry.unregister(&user("bob"), kept.id()));
    assert_eq!(ids(&registry.lookup(&alice)), ids(&[kept]));
}

#[rstest]
fn users_do_not_see_each_others_connections(registry: PresenceRegistry) {
    let (alice_conn, _rx_a) = connection();
    let (bob_conn, _rx_b) = connection();
    registry.register(&user("alice"), alice_conn.clone()).expect("registered");
    registry.register(&user("bob"), bob_conn.clone()).expect("registered");

    assert_eq!(ids(&registry.lookup(&user("alice"))), ids(&[alice_conn]));
    assert_eq!(ids(&registry.lookup(&user("bob"))), ids(&[bob_conn]));
    assert_eq!(registry.online_users(), 2);
}

#[rstest]
fn a_connection_cannot_be_claimed_by_a_second_user(registry: PresenceRegistry) {
    let (handle, _rx) = connection();
    registry
        .register(&user("alice"), handle.clone())
        .expect("registered");

    let err = registry
        .register(&user("bob"), handle.clone())
        .expect_err("already claimed");
    assert_eq!(
        err,
        PresenceError::ClaimedByAnotherUser {
            connection_id: handle.id(),
            owner: user("alice"),
        }
    );
    assert!(!registry.is_online(&user("bob")));
    assert_eq!(ids(&registry.lookup(&user("alice"))), ids(&[handle.clone()]));
    assert_eq!(registry.owner_of(handle.id()), Some(user("alice")));
}

#[rstest]
fn unregister_releases_the_claim(registry: PresenceRegistry) {
    let (handle, _rx) = connection();
    registry
        .register(&user("alice"), handle.clone())
        .expect("registered");
    assert!(!registry.unregister(&user("bob"), handle.id()));
    assert_eq!(registry.owner_of(handle.id()), Some(user("alice")));

    assert!(registry.unregister(&user("alice"), handle.id()));
    assert_eq!(registry.owner_of(handle.id()), None);
    registry
        .register(&user("bob"), handle.clone())
        .expect("free to register again");
    assert_eq!(ids(&registry.lookup(&user("bob"))), ids(&[handle]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_churn_never_exposes_removed_connections() {
    let registry = Arc::new(PresenceRegistry::new());
    let removed = Arc::new(DashSet::new());
    let alice = user("alice");
    let (anchor, _rx_anchor) = connection();
    registry.register(&alice, anchor.clone()).expect("registered");

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        let removed = Arc::clone(&removed);
        let alice = alice.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                let (handle, _rx) = connection();
                registry.register(&alice, handle.clone()).expect("registered");
                tokio::task::yield_now().await;
                assert!(registry.unregister(&alice, handle.id()));
                removed.insert(handle.id());
                tokio::task::yield_now().await;
            }
        }));
    }

    let reader = {
        let registry = Arc::clone(&registry);
        let removed = Arc::clone(&removed);
        let alice = alice.clone();
        let anchor_id = anchor.id();
        tokio::spawn(async move {
            for _ in 0..800 {
                let gone: Vec<ConnectionId> = removed.iter().map(|id| *id).collect();
                let snapshot = registry.lookup(&alice);
                assert!(snapshot.iter().any(|handle| handle.id() == anchor_id));
                assert!(
                    snapshot.iter().all(|handle| !gone.contains(&handle.id())),
                    "lookup returned a connection that was already unregistered"
                );
                tokio::task::yield_now().await;
            }
        })
    };

    for task in tasks {
        task.await.expect("churn task completes");
    }
    reader.await.expect("reader completes");

    assert_eq!(removed.len(), 800);
    assert_eq!(ids(&registry.lookup(&alice)), ids(&[anchor]));
    assert_eq!(registry.connection_count(), 1);
}
