//! Kitsheet Engine library.
//!
//! Orchestrates the character sheet model against the host.
//!
//! ## Structure
//!
//! - `use_cases/` - Stat and category edits, sheet preparation, rolls
//! - `infrastructure/` - Port traits for the host plus built-in adapters
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::{App, HostPorts};
