//! Presence publishing.
//!
//! Announcements are two-phase. [`PresencePublisher`] commits the registry
//! change synchronously and queues a [`PresenceTransition`]; the
//! [`PresenceWorker`] then writes the durable status and broadcasts the
//! change to every connection. A user's transitions complete in the order
//! they were queued, so its offline broadcast can never overtake its online
//! broadcast, while other users are never held up by that user's writes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chatrelay_domain::{ConnectionId, PresenceStatus, UserId};
use chatrelay_shared::ServerMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::connections::{ConnectionError, ConnectionManager};
use crate::infrastructure::ports::{ClockPort, UserStatusRepo};

/// A committed status change awaiting persistence and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceTransition {
    pub user_id: UserId,
    pub status: PresenceStatus,
}

impl PresenceTransition {
    pub fn online(user_id: UserId) -> Self {
        Self {
            user_id,
            status: PresenceStatus::Online,
        }
    }

    pub fn offline(user_id: UserId) -> Self {
        Self {
            user_id,
            status: PresenceStatus::Offline,
        }
    }
}

/// Outcome of an identity announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// Registered and queued for publication.
    Published {
        /// Earlier connection of the same user that lost the mapping.
        replaced: Option<ConnectionId>,
    },
    /// The announcement was ignored.
    Ignored(ConnectionError),
}

/// Publishes online/offline transitions for announcing connections.
pub struct PresencePublisher {
    connections: Arc<ConnectionManager>,
    transitions: mpsc::UnboundedSender<PresenceTransition>,
}

impl PresencePublisher {
    /// Create the publisher and the worker that completes its transitions.
    pub fn new(
        connections: Arc<ConnectionManager>,
        user_status: Arc<dyn UserStatusRepo>,
        clock: Arc<dyn ClockPort>,
        write_timeout: Duration,
    ) -> (Self, PresenceWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = PresenceWorker {
            transitions: rx,
            sink: Arc::new(PresenceSink {
                connections: connections.clone(),
                user_status,
                clock,
                write_timeout,
            }),
            in_flight: HashMap::new(),
        };
        (
            Self {
                connections,
                transitions: tx,
            },
            worker,
        )
    }

    /// The connection declared its identity.
    pub async fn announce_online(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        username: String,
    ) -> AnnounceOutcome {
        match self
            .connections
            .register(connection_id, user_id.clone(), username.clone())
            .await
        {
            Ok(replaced) => {
                tracing::info!(
                    connection_id = %connection_id,
                    user_id = %user_id,
                    username = %username,
                    "User is online"
                );
                self.enqueue(PresenceTransition::online(user_id));
                AnnounceOutcome::Published { replaced }
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    user_id = %user_id,
                    error = %e,
                    "Ignoring identity announcement"
                );
                AnnounceOutcome::Ignored(e)
            }
        }
    }

    /// The connection went away. Returns the user that went offline, or
    /// `None` when the connection owned no registry entry.
    pub async fn announce_offline(&self, connection_id: ConnectionId) -> Option<UserId> {
        let user_id = self.connections.unregister(connection_id).await?;
        tracing::info!(
            connection_id = %connection_id,
            user_id = %user_id,
            "User is offline"
        );
        self.enqueue(PresenceTransition::offline(user_id.clone()));
        Some(user_id)
    }

    fn enqueue(&self, transition: PresenceTransition) {
        if let Err(e) = self.transitions.send(transition) {
            tracing::error!(
                user_id = %e.0.user_id,
                status = %e.0.status,
                "Presence worker has stopped, transition dropped"
            );
        }
    }
}

/// Completes queued transitions: durable write first, broadcast second.
///
/// Each user's transitions run one after another in queue order; different
/// users proceed independently, so a slow write only delays its own user.
pub struct PresenceWorker {
    transitions: mpsc::UnboundedReceiver<PresenceTransition>,
    sink: Arc<PresenceSink>,
    /// Latest unfinished transition per user. The next one for the same
    /// user waits for it.
    in_flight: HashMap<UserId, JoinHandle<()>>,
}

impl PresenceWorker {
    /// Run until every publisher handle has been dropped, then let the
    /// transitions still in flight finish.
    pub async fn run(mut self) {
        while let Some(transition) = self.transitions.recv().await {
            self.dispatch(transition);
        }
        for (user_id, handle) in self.in_flight.drain() {
            if let Err(e) = handle.await {
                tracing::warn!(user_id = %user_id, error = %e, "Presence transition task failed");
            }
        }
        tracing::debug!("Presence worker stopped");
    }

    /// Persist one transition (best effort) and broadcast it.
    pub async fn process(&self, transition: PresenceTransition) {
        self.sink.process(transition).await;
    }

    fn dispatch(&mut self, transition: PresenceTransition) {
        self.in_flight.retain(|_, handle| !handle.is_finished());

        let user_id = transition.user_id.clone();
        let previous = self.in_flight.remove(&user_id);
        let sink = self.sink.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    tracing::warn!(
                        user_id = %transition.user_id,
                        error = %e,
                        "Previous presence transition task failed"
                    );
                }
            }
            sink.process(transition).await;
        });
        self.in_flight.insert(user_id, handle);
    }
}

/// Store and audience shared by every in-flight transition.
struct PresenceSink {
    connections: Arc<ConnectionManager>,
    user_status: Arc<dyn UserStatusRepo>,
    clock: Arc<dyn ClockPort>,
    write_timeout: Duration,
}

impl PresenceSink {
    async fn process(&self, transition: PresenceTransition) {
        self.persist(&transition).await;

        let delivered = self
            .connections
            .broadcast_all(ServerMessage::UserStatusChange {
                user_id: transition.user_id.clone(),
                status: transition.status,
            })
            .await;
        tracing::debug!(
            user_id = %transition.user_id,
            status = %transition.status,
            delivered,
            "Broadcast user status change"
        );
    }

    async fn persist(&self, transition: &PresenceTransition) {
        let write = self.user_status.set_status(
            &transition.user_id,
            transition.status,
            self.clock.now(),
        );

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    user_id = %transition.user_id,
                    status = %transition.status,
                    error = %e,
                    "Error updating user status"
                );
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %transition.user_id,
                    status = %transition.status,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "Timed out updating user status"
                );
            }
        }
    }
}
