//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// A face in `1..=sides`.
    fn roll_die(&self, sides: u32) -> u32;
}
