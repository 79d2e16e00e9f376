//! Chat relay protocol - shared types for relay and client communication
//!
//! This crate contains the WebSocket message types exchanged between the
//! relay (receiving `ClientMessage`, sending `ServerMessage`) and chat clients.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and the domain vocabulary
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Validated at the edge** - identifiers reject blank values while parsing

pub mod messages;

pub use messages::{ChatMessage, ClientMessage, ServerMessage};
