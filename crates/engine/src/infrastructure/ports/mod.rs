//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Durable user status (could swap SQLite -> Postgres/Mongo)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::UserStatusRepo;
pub use testing::ClockPort;

#[cfg(test)]
pub use repos::MockUserStatusRepo;
#[cfg(test)]
pub use testing::MockClockPort;
