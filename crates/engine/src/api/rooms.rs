//! Room membership for conversations and group chats.
//!
//! A room is only the set of connections that joined it. Nothing is
//! persisted, and a room disappears as soon as its last member leaves.

use std::collections::{HashMap, HashSet};

use chatrelay_domain::{ConnectionId, RoomId};
use tokio::sync::RwLock;

#[derive(Default)]
struct Memberships {
    /// room -> member connections
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    /// connection -> joined rooms, for cleanup on disconnect
    joined: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl Memberships {
    fn remove(&mut self, connection_id: ConnectionId, room_id: &RoomId) -> bool {
        let Some(members) = self.members.get_mut(room_id) else {
            return false;
        };
        let removed = members.remove(&connection_id);
        if members.is_empty() {
            self.members.remove(room_id);
        }

        if let Some(rooms) = self.joined.get_mut(&connection_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                self.joined.remove(&connection_id);
            }
        }
        removed
    }
}

/// Tracks which connections belong to which rooms.
pub struct RoomManager {
    memberships: RwLock<Memberships>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            memberships: RwLock::new(Memberships::default()),
        }
    }

    /// Add a connection to a room. Returns `false` if it was already a member.
    pub async fn join(&self, connection_id: ConnectionId, room_id: RoomId) -> bool {
        let mut memberships = self.memberships.write().await;
        let added = memberships
            .members
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id);
        memberships
            .joined
            .entry(connection_id)
            .or_default()
            .insert(room_id);
        added
    }

    /// Remove a connection from a room. Returns `false` if it was not a member.
    pub async fn leave(&self, connection_id: ConnectionId, room_id: &RoomId) -> bool {
        self.memberships.write().await.remove(connection_id, room_id)
    }

    /// Drop every membership of a connection, returning the rooms it left.
    pub async fn leave_all(&self, connection_id: ConnectionId) -> Vec<RoomId> {
        let mut memberships = self.memberships.write().await;
        let rooms: Vec<RoomId> = memberships
            .joined
            .get(&connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        for room_id in &rooms {
            memberships.remove(connection_id, room_id);
        }
        rooms
    }

    /// Members of a room other than `exclude`.
    pub async fn recipients(
        &self,
        room_id: &RoomId,
        exclude: Option<ConnectionId>,
    ) -> Vec<ConnectionId> {
        let memberships = self.memberships.read().await;
        memberships
            .members
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|id| Some(*id) != exclude)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) async fn is_member(&self, connection_id: ConnectionId, room_id: &RoomId) -> bool {
        let memberships = self.memberships.read().await;
        memberships
            .members
            .get(room_id)
            .is_some_and(|members| members.contains(&connection_id))
    }

    /// Rooms that currently have at least one member.
    #[cfg(test)]
    pub(crate) async fn room_count(&self) -> usize {
        self.memberships.read().await.members.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
