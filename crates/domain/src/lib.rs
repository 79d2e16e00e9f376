//! Chat relay domain types.
//!
//! Vocabulary shared by the wire protocol and the relay engine: connection,
//! user and room identifiers, presence status, and the domain error type.

pub mod error;
pub mod ids;
pub mod presence;

pub use error::DomainError;
pub use ids::{ConnectionId, RoomId, UserId};
pub use presence::{PresenceStatus, UserPresence};
