//! Write boundary: complete replacement values for top-level fields.
//!
//! Mutations never patch lists in place. Each one yields a field value that
//! names its dot-path and serializes to the full new value, so the
//! persistence layer can diff or transmit it however it likes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Category, ColorStats, CoreStat, RollDetails};
use crate::value_objects::{HexColor, Stat};
use crate::{DomainError, FeatureId};

/// A dot-path and the complete JSON value to store there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CharacterField {
    Name(String),
    Core(CoreStat, Stat),
    ColorStats(ColorStats),
    Categories(Vec<Category>),
    Biography(String),
    Class(String),
    Word(String),
    Kind(String),
    Color(HexColor),
}

impl CharacterField {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Core(CoreStat::Stamina, _) => "system.stamina",
            Self::Core(CoreStat::Proficiency, _) => "system.proficiency",
            Self::Core(CoreStat::Movement, _) => "system.movement",
            Self::ColorStats(_) => "system.colorStats",
            Self::Categories(_) => "system.categories",
            Self::Biography(_) => "system.biography",
            Self::Class(_) => "system.class",
            Self::Word(_) => "system.word",
            Self::Kind(_) => "system.type",
            Self::Color(_) => "system.color",
        }
    }

    pub fn to_update(&self) -> Result<FieldUpdate, DomainError> {
        let value = match self {
            Self::Name(text)
            | Self::Biography(text)
            | Self::Class(text)
            | Self::Word(text)
            | Self::Kind(text) => Value::String(text.clone()),
            Self::Core(_, stat) => serde_json::to_value(stat)?,
            Self::ColorStats(stats) => serde_json::to_value(stats)?,
            Self::Categories(categories) => serde_json::to_value(categories)?,
            Self::Color(color) => Value::String(color.to_string()),
        };
        Ok(FieldUpdate {
            path: self.path().to_string(),
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureField {
    Name(String),
    Color(Option<HexColor>),
    Category(String),
    Stats(Vec<Stat>),
    Description(String),
    Details(RollDetails),
}

impl FeatureField {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Color(_) => "system.color",
            Self::Category(_) => "system.category",
            Self::Stats(_) => "system.stats",
            Self::Description(_) => "system.description",
            Self::Details(_) => "system.details",
        }
    }

    pub fn to_update(&self) -> Result<FieldUpdate, DomainError> {
        let value = match self {
            Self::Name(text) | Self::Category(text) | Self::Description(text) => {
                Value::String(text.clone())
            }
            Self::Color(color) => serde_json::to_value(color)?,
            Self::Stats(stats) => serde_json::to_value(stats)?,
            Self::Details(details) => serde_json::to_value(details)?,
        };
        Ok(FieldUpdate {
            path: self.path().to_string(),
            value,
        })
    }
}

/// Result of renaming a category: the new category list plus the
/// category field of every feature that pointed at the old name.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRename {
    pub categories: CharacterField,
    pub features: Vec<(FeatureId, FeatureField)>,
}

/// Result of deleting a category. Delete `features` first, then write
/// `categories`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDeletion {
    pub categories: CharacterField,
    pub features: Vec<FeatureId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::StatColor;
    use serde_json::json;

    #[test]
    fn test_character_color_stats_update_is_complete() {
        let stats = ColorStats::default().with(StatColor::Blue, Some(Stat::value("wit", 2.0)));
        let update = CharacterField::ColorStats(stats).to_update().unwrap();
        assert_eq!(update.path, "system.colorStats");

        let slots = update.value.as_object().unwrap();
        assert_eq!(slots.len(), 8);
        assert_eq!(slots["red"], Value::Null);
        assert_eq!(slots["blue"]["tag"], json!("wit"));
        assert_eq!(slots["blue"]["color"], json!("blue"));
    }

    #[test]
    fn test_scalar_paths() {
        let update = CharacterField::Kind("Rogue".into()).to_update().unwrap();
        assert_eq!(update, FieldUpdate { path: "system.type".into(), value: json!("Rogue") });

        let update = FeatureField::Color(None).to_update().unwrap();
        assert_eq!(update.path, "system.color");
        assert_eq!(update.value, Value::Null);

        let update = CharacterField::Color(HexColor::from_rgb(0x12, 0x34, 0x56))
            .to_update()
            .unwrap();
        assert_eq!(update.value, json!("#123456"));
    }

    #[test]
    fn test_feature_stats_update_is_full_list() {
        let update = FeatureField::Stats(vec![Stat::value("ammo", 6.0), Stat::value("range", 30.0)])
            .to_update()
            .unwrap();
        assert_eq!(update.path, "system.stats");
        assert_eq!(update.value.as_array().unwrap().len(), 2);
        assert_eq!(update.value[1]["value"], json!(30.0));
    }
}
