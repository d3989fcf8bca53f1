//! Value objects - Immutable objects defined by their attributes

mod color;
mod dice;
mod palette;
mod roll;
mod stat;
mod system_config;
mod tracker;

pub use color::{HexColor, StatColor};
pub use dice::{DiceExpression, FormulaError, FormulaEvaluation, RollData, RollMode};
pub use palette::{derive_palette, luma, Contrast, Palette};
pub use roll::{classify_crit, CritKind, RollPlan, FALLBACK_FORMULA};
pub use stat::{Stat, StatView};
pub use system_config::{label_keys, SystemConfig};
pub use tracker::{TrackedStat, Tracker};
