//! Connection management for WebSocket clients.
//!
//! Tracks live connections and the registry of announced users. Both live
//! under one lock so a registration and the identity stored on the
//! connection always change together.

use std::collections::HashMap;

use chatrelay_domain::{ConnectionId, UserId};
use chatrelay_shared::ServerMessage;
use tokio::sync::{mpsc, RwLock};

/// Information about a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: ConnectionId,
    /// Logical user, set once the client announces itself
    pub user_id: Option<UserId>,
    /// Display name given with the announcement
    pub username: Option<String>,
}

impl ConnectionInfo {
    fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            user_id: None,
            username: None,
        }
    }

    /// Whether the client has announced its identity.
    pub fn is_announced(&self) -> bool {
        self.user_id.is_some()
    }
}

#[derive(Default)]
struct Registry {
    /// connection_id -> (ConnectionInfo, sender channel)
    connections: HashMap<ConnectionId, (ConnectionInfo, mpsc::Sender<ServerMessage>)>,
    /// user_id -> owning connection (last announcement wins)
    users: HashMap<UserId, ConnectionId>,
}

impl Registry {
    /// Reverse lookup for connections whose stored identity is missing.
    fn scan_for_user(&self, connection_id: ConnectionId) -> Option<UserId> {
        self.users
            .iter()
            .find(|(_, owner)| **owner == connection_id)
            .map(|(user_id, _)| user_id.clone())
    }
}

/// Manages all active WebSocket connections and the user registry.
pub struct ConnectionManager {
    registry: RwLock<Registry>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Track a freshly established transport session.
    pub async fn open(&self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        let mut registry = self.registry.write().await;
        registry
            .connections
            .insert(connection_id, (ConnectionInfo::new(connection_id), sender));
        tracing::debug!(connection_id = %connection_id, "Connection opened");
    }

    /// Forget a transport session. Registry entries must be released with
    /// [`ConnectionManager::unregister`] first.
    pub async fn close(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let mut registry = self.registry.write().await;
        let removed = registry.connections.remove(&connection_id).map(|(info, _)| info);
        if removed.is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection closed");
        }
        removed
    }

    /// Record `user_id -> connection_id`, overwriting any earlier mapping for
    /// the user, and store the identity on the connection.
    ///
    /// Returns the connection that previously owned the user, when it was a
    /// different one. That connection stays open and is not notified.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        username: String,
    ) -> Result<Option<ConnectionId>, ConnectionError> {
        let mut registry = self.registry.write().await;

        let (info, _) = registry
            .connections
            .get_mut(&connection_id)
            .ok_or(ConnectionError::NotFound)?;
        if info.is_announced() {
            return Err(ConnectionError::AlreadyAnnounced);
        }
        info.user_id = Some(user_id.clone());
        info.username = Some(username);

        let previous = registry
            .users
            .insert(user_id.clone(), connection_id)
            .filter(|previous| *previous != connection_id);

        if let Some(previous) = previous {
            tracing::info!(
                user_id = %user_id,
                connection_id = %connection_id,
                previous_connection_id = %previous,
                "User announced from a new connection, previous mapping replaced"
            );
        }

        Ok(previous)
    }

    /// Remove the registry entry owned by `connection_id`.
    ///
    /// The user stored on the connection is tried first; a scan of the
    /// registry covers connections that lost or never recorded it. Returns
    /// `None` when no entry maps to this connection, including when a newer
    /// connection has since taken the user over.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<UserId> {
        let mut registry = self.registry.write().await;

        let user_id = registry
            .connections
            .get(&connection_id)
            .and_then(|(info, _)| info.user_id.clone())
            .or_else(|| registry.scan_for_user(connection_id))?;

        if registry.users.get(&user_id) != Some(&connection_id) {
            tracing::debug!(
                connection_id = %connection_id,
                user_id = %user_id,
                "Connection no longer owns its user, registry left unchanged"
            );
            return None;
        }

        registry.users.remove(&user_id);
        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            "User unregistered"
        );
        Some(user_id)
    }

    /// All users currently registered, in no particular order.
    pub async fn list_active_users(&self) -> Vec<UserId> {
        let registry = self.registry.read().await;
        registry.users.keys().cloned().collect()
    }

    /// Connection currently owning `user_id`.
    #[cfg(test)]
    pub(crate) async fn connection_for(&self, user_id: &UserId) -> Option<ConnectionId> {
        let registry = self.registry.read().await;
        registry.users.get(user_id).copied()
    }

    /// Get connection info by ID.
    #[cfg(test)]
    pub(crate) async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let registry = self.registry.read().await;
        registry
            .connections
            .get(&connection_id)
            .map(|(info, _)| info.clone())
    }

    /// Display name announced on a connection.
    pub async fn username(&self, connection_id: ConnectionId) -> Option<String> {
        let registry = self.registry.read().await;
        registry
            .connections
            .get(&connection_id)
            .and_then(|(info, _)| info.username.clone())
    }

    /// Number of open connections.
    #[cfg(test)]
    pub(crate) async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    /// Send a message to one connection.
    #[cfg(test)]
    pub(crate) async fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) -> bool {
        let registry = self.registry.read().await;
        match registry.connections.get(&connection_id) {
            Some((_, sender)) => try_deliver(connection_id, sender, message),
            None => false,
        }
    }

    /// Send a message to each listed connection. Returns how many accepted it.
    pub async fn send_to_each(&self, connection_ids: &[ConnectionId], message: ServerMessage) -> usize {
        let registry = self.registry.read().await;
        connection_ids
            .iter()
            .filter_map(|id| registry.connections.get(id).map(|(_, sender)| (*id, sender)))
            .filter(|(id, sender)| try_deliver(*id, sender, message.clone()))
            .count()
    }

    /// Broadcast a message to every open connection.
    pub async fn broadcast_all(&self, message: ServerMessage) -> usize {
        let registry = self.registry.read().await;
        registry
            .connections
            .iter()
            .filter(|(id, (_, sender))| try_deliver(**id, sender, message.clone()))
            .count()
    }

    /// Map a user to a connection without touching the connection's stored
    /// identity (tests only).
    #[cfg(test)]
    pub(crate) async fn insert_user_mapping(&self, user_id: UserId, connection_id: ConnectionId) {
        self.registry.write().await.users.insert(user_id, connection_id);
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn try_deliver(
    connection_id: ConnectionId,
    sender: &mpsc::Sender<ServerMessage>,
    message: ServerMessage,
) -> bool {
    match sender.try_send(message) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Failed to deliver message"
            );
            false
        }
    }
}

/// Errors that can occur during connection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection not found")]
    NotFound,
    #[error("Connection has already announced its identity")]
    AlreadyAnnounced,
}
