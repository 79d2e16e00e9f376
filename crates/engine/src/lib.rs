//! Chat relay engine library.
//!
//! Tracks which users are online, which connections belong to which
//! conversation or group rooms, and relays chat traffic between them.
//!
//! ## Structure
//!
//! - `use_cases/` - Presence publishing and room-scoped relaying
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Connection registry, rooms, HTTP and WebSocket entry points
//! - `app` - Application composition
//! - `config` - Environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
