//! Common utility functions shared across the models.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **Non-mutating** - list helpers return new collections

pub mod sequence;
pub mod string;

// Re-export commonly used functions at crate root for convenience
pub use sequence::{Query, Selector};
pub use string::{escape_html, format_number, none_if_blank, normalize_key};
