//! Persistence adapters.

mod user_status_repository;

pub use user_status_repository::SqliteUserStatusRepo;
