//! Infrastructure layer - ports and their adapters.

pub mod clock;
pub mod persistence;
pub mod ports;
