//! Presence registry: which live connections belong to which user.
//!
//! The registry is the single shared mutable structure in the relay. All
//! mutation goes through [`PresenceRegistry::register`] and
//! [`PresenceRegistry::unregister`]; both run under the owning shard's lock,
//! so a concurrent [`PresenceRegistry::lookup`] observes either the state
//! before or after a mutation, never a partially removed connection.
//!
//! ## Invariants
//! - A connection appears under at most one user id. The `owners` index
//!   records the claim and is only changed together with `entries`, always
//!   locking `owners` before `entries`.
//! - Entries are never empty: removing the last connection deletes the key,
//!   so "user is online" is the same as "key is present".

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ConnectionHandle, ConnectionId, UserId};

/// Registration conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// The connection is already bound to a different user.
    #[error("connection {connection_id} is already registered to user {owner}")]
    ClaimedByAnotherUser {
        /// Connection that was offered twice.
        connection_id: ConnectionId,
        /// User the connection is registered under.
        owner: UserId,
    },
}

/// Concurrent map from user id to that user's live connections.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: DashMap<UserId, HashMap<ConnectionId, ConnectionHandle>>,
    owners: DashMap<ConnectionId, UserId>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the user's set. Re-registering under the same user
    /// is a no-op.
    ///
    /// # Errors
    /// Returns [`PresenceError::ClaimedByAnotherUser`] when the connection is
    /// already registered under a different user; nothing changes.
    pub fn register(
        &self,
        user_id: &UserId,
        connection: ConnectionHandle,
    ) -> Result<(), PresenceError> {
        let connection_id = connection.id();
        match self.owners.entry(connection_id) {
            Entry::Occupied(owner) if owner.get() != user_id => {
                warn!(
                    user_id = %user_id,
                    owner = %owner.get(),
                    connection_id = %connection_id,
                    "connection already claimed by another user"
                );
                Err(PresenceError::ClaimedByAnotherUser {
                    connection_id,
                    owner: owner.get().clone(),
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                let mut connections = self.entries.entry(user_id.clone()).or_default();
                connections.insert(connection_id, connection);
                debug!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    connections = connections.len(),
                    "connection registered"
                );
                drop(connections);
                slot.insert(user_id.clone());
                Ok(())
            }
        }
    }

    /// Remove a connection, deleting the entry once it is empty.
    ///
    /// Returns `true` when the connection was registered under `user_id`.
    pub fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let mut removed = false;
        self.owners.remove_if(&connection_id, |_, owner| {
            if owner != user_id {
                return false;
            }
            self.entries.remove_if_mut(user_id, |_, connections| {
                removed = connections.remove(&connection_id).is_some();
                connections.is_empty()
            });
            true
        });
        if removed {
            debug!(user_id = %user_id, connection_id = %connection_id, "connection unregistered");
        }
        removed
    }

    /// User the connection is registered under, if any.
    pub fn owner_of(&self, connection_id: ConnectionId) -> Option<UserId> {
        self.owners.get(&connection_id).map(|owner| owner.value().clone())
    }

    /// Point-in-time snapshot of the user's live connections.
    pub fn lookup(&self, user_id: &UserId) -> Vec<ConnectionHandle> {
        self.entries
            .get(user_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the user has at least one live connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.entries.contains_key(user_id)
    }

    /// Number of users with at least one live connection.
    pub fn online_users(&self) -> usize {
        self.entries.len()
    }

    /// Total number of registered connections across all users.
    pub fn connection_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
