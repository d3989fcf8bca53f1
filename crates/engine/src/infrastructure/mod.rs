//! Infrastructure implementations.
//!
//! Port traits for the host services plus the built-in adapters the
//! console binary runs against.

pub mod clock;
pub mod config;
pub mod console;
pub mod dice;
pub mod documents;
pub mod ports;
pub mod templates;
