//! Use cases - User story orchestration.
//!
//! Each module drives the domain model for one area of the sheet and
//! talks to the host only through the ports in `infrastructure::ports`.

pub mod categories;
pub mod roll;
pub mod sheet;
pub mod stats;

pub use categories::{CategoryEdit, CategoryOps, CategoryOpsError};
pub use roll::{RollError, RollFeature, RollOptions, RollOutcome};
pub use sheet::{CategorySection, CharacterSheet, FeatureRow, FeatureSheet, PrepareSheet};
pub use stats::{StatOps, StatOpsError};
