//! Entities - documents with identity

mod category;
mod character;
mod feature;

pub use category::Category;
pub use character::{CharacterData, Character, ClassLevel, ColorStats, CoreStat};
pub use feature::{Feature, FeatureData, OwnedFeature, RollDetails, Usage, ACTOR_PREFIX};
