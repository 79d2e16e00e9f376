//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use crate::api::connections::ConnectionManager;
use crate::api::rooms::RoomManager;
use crate::infrastructure::ports::{ClockPort, UserStatusRepo};
use crate::use_cases::presence::{PresencePublisher, PresenceWorker};
use crate::use_cases::relay::MessageRelay;

/// Main application state.
///
/// Owns the process-wide registry and room memberships; nothing else in the
/// process mutates them. Passed to WebSocket handlers via Axum state.
pub struct App {
    pub connections: Arc<ConnectionManager>,
    pub rooms: Arc<RoomManager>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub presence: Arc<PresencePublisher>,
    pub relay: Arc<MessageRelay>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// The returned worker completes presence transitions and must be
    /// spawned by the caller.
    pub fn new(
        user_status: Arc<dyn UserStatusRepo>,
        clock: Arc<dyn ClockPort>,
        presence_write_timeout: Duration,
    ) -> (Self, PresenceWorker) {
        let connections = Arc::new(ConnectionManager::new());
        let rooms = Arc::new(RoomManager::new());

        let (presence, worker) = PresencePublisher::new(
            connections.clone(),
            user_status,
            clock,
            presence_write_timeout,
        );
        let relay = MessageRelay::new(connections.clone(), rooms.clone());

        let app = Self {
            connections,
            rooms,
            use_cases: UseCases {
                presence: Arc::new(presence),
                relay: Arc::new(relay),
            },
        };
        (app, worker)
    }
}
