//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.

pub mod presence;
pub mod relay;

pub use presence::{PresencePublisher, PresenceWorker};
pub use relay::MessageRelay;
