//! Feature entity - a kit piece owned by a character
//!
//! Features carry their own stat list, a category membership (by name) and
//! the roll details used by the roll protocol.

use serde::{Deserialize, Serialize};

use crate::common::sequence::{self, Selector};
use crate::common::normalize_key;
use crate::enrichment::{StatContext, StatKind};
use crate::entities::Character;
use crate::stat_container::{ensure_unique_tag, validate_stat, StatContainer};
use crate::updates::FeatureField;
use crate::value_objects::{HexColor, Palette, Stat, SystemConfig, TrackedStat};
use crate::{CharacterId, DomainError, FeatureId};

/// Prefix under which an owner's stats appear in a feature's context.
pub const ACTOR_PREFIX: &str = "actor.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Uses per timeframe, if limited
    #[serde(default)]
    pub multiple: Option<u32>,
    #[serde(default)]
    pub timeframe: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollDetails {
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureData {
    /// Explicit override; otherwise the category colour applies
    #[serde(default)]
    pub color: Option<HexColor>,
    /// Category name on the owner, empty when uncategorised
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stats: Vec<Stat>,
    /// Rich text with inline tags
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: RollDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    /// Owning character, when embedded
    #[serde(default)]
    pub owner: Option<CharacterId>,
    #[serde(default)]
    pub system: FeatureData,
}

impl Feature {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Feature name cannot be empty"));
        }
        Ok(Self {
            id: FeatureId::new(),
            name: name.to_string(),
            owner: None,
            system: FeatureData::default(),
        })
    }

    pub fn owned_by(mut self, owner: CharacterId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.system.details.formula = formula.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.system.description = description.into();
        self
    }

    pub fn with_stat(mut self, stat: Stat) -> Self {
        self.system.stats.push(stat.normalized());
        self
    }

    pub fn is_categorized(&self) -> bool {
        !self.system.category.is_empty()
    }

    /// Feature colour over the owner's base colour. Without an explicit
    /// colour the owner category's colour applies.
    pub fn palette(&self, owner: Option<&Character>, config: &SystemConfig) -> Palette {
        match owner {
            Some(owner) => {
                let category_color = owner
                    .category(&self.system.category)
                    .and_then(|category| category.color);
                Palette::from_colors(owner.system.color, self.system.color.or(category_color))
            }
            None => Palette::from_colors(config.default_color, self.system.color),
        }
    }

    /// One entry per tracker of the owner's category, in tracker order.
    pub fn tracked_stats(&self, owner: &Character, config: &SystemConfig) -> Vec<TrackedStat> {
        owner
            .category(&self.system.category)
            .map(|category| category.tracked_stats(&self.system.stats, &config.placeholder_icon))
            .unwrap_or_default()
    }

    /// Borrow this feature together with its owner.
    pub fn with_owner<'a>(&'a self, owner: &'a Character) -> OwnedFeature<'a> {
        OwnedFeature {
            feature: self,
            owner,
        }
    }

    /// Fold a persisted field back into the model.
    pub fn apply(&mut self, field: FeatureField) {
        match field {
            FeatureField::Name(name) => self.name = name,
            FeatureField::Color(color) => self.system.color = color,
            FeatureField::Category(category) => self.system.category = category,
            FeatureField::Stats(stats) => self.system.stats = stats,
            FeatureField::Description(text) => self.system.description = text,
            FeatureField::Details(details) => self.system.details = details,
        }
    }

    // -------------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------------

    /// Insert a stat at `index` or append it.
    pub fn add_stat(&self, stat: Stat, index: Option<usize>) -> Result<FeatureField, DomainError> {
        let mut stat = validate_stat(stat)?;
        stat.color = None;
        ensure_unique_tag(self.system.stats.iter().map(|s| s.tag.as_str()), &stat.tag)?;
        Ok(FeatureField::Stats(sequence::add(
            &self.system.stats,
            stat,
            index,
        )))
    }

    /// Deep-merge `patch` onto the first matching stat. `None` on a miss.
    pub fn update_stat(
        &self,
        selector: &Selector,
        patch: &serde_json::Value,
    ) -> Result<Option<FeatureField>, DomainError> {
        let Some(index) = sequence::index_of(&self.system.stats, selector) else {
            return Ok(None);
        };
        let current = &self.system.stats[index];
        let mut updated = validate_stat(sequence::merge_record(current, patch)?)?;
        updated.color = None;
        if updated.tag != current.tag {
            ensure_unique_tag(
                self.system
                    .stats
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, s)| s.tag.as_str()),
                &updated.tag,
            )?;
        }

        let mut stats = self.system.stats.clone();
        stats[index] = updated;
        Ok(Some(FeatureField::Stats(stats)))
    }

    /// `None` when nothing matches.
    pub fn remove_stat(&self, selector: &Selector) -> Option<FeatureField> {
        sequence::has(&self.system.stats, selector)
            .then(|| FeatureField::Stats(sequence::remove(&self.system.stats, selector)))
    }

    // -------------------------------------------------------------------------
    // Other fields
    // -------------------------------------------------------------------------

    /// File under one of the owner's categories; blank clears it.
    pub fn set_category(&self, name: &str, owner: &Character) -> Result<FeatureField, DomainError> {
        let name = normalize_key(name);
        if !name.is_empty() && owner.category(&name).is_none() {
            return Err(DomainError::validation(format!(
                "Category '{}' does not exist on {}",
                name, owner.name
            )));
        }
        Ok(FeatureField::Category(name))
    }

    pub fn set_color(&self, hex: Option<&str>) -> Result<FeatureField, DomainError> {
        Ok(FeatureField::Color(hex.map(HexColor::parse).transpose()?))
    }

    /// Store a formula as typed. Validity is decided at roll time.
    pub fn set_formula(&self, formula: &str) -> FeatureField {
        FeatureField::Details(RollDetails {
            formula: formula.trim().to_string(),
            ..self.system.details.clone()
        })
    }
}

impl StatContainer for Feature {
    fn owned_stats(&self) -> Vec<&Stat> {
        self.system.stats.iter().collect()
    }

    fn stat_context(&self) -> StatContext {
        let mut context = StatContext::new();
        for stat in &self.system.stats {
            context.insert(&stat.tag, stat.clone(), StatKind::Feature);
        }
        context
    }
}

/// A feature viewed together with its owning character. Its stat context
/// adds every owner entry under the `actor.` prefix.
#[derive(Debug, Clone, Copy)]
pub struct OwnedFeature<'a> {
    pub feature: &'a Feature,
    pub owner: &'a Character,
}

impl StatContainer for OwnedFeature<'_> {
    fn owned_stats(&self) -> Vec<&Stat> {
        self.feature.owned_stats()
    }

    fn stat_context(&self) -> StatContext {
        let mut context = self.feature.stat_context();
        context.extend_prefixed(ACTOR_PREFIX, &self.owner.stat_context());
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::sequence::Query;
    use crate::value_objects::{StatColor, StatView};
    use serde_json::json;

    fn owner() -> Character {
        let mut character = Character::new("Ash", &SystemConfig::default()).unwrap();
        character.system.color = HexColor::from_rgb(0, 0, 0);
        let field = character
            .add_color_stat(Stat::value("might", 3.0), Some(StatColor::Red))
            .unwrap();
        character.apply(field);
        character
    }

    fn by_tag(tag: &str) -> Selector {
        Query::new().field("tag", tag).into()
    }

    #[test]
    fn test_add_stat_rejects_duplicates() {
        let feature = Feature::new("Bow").unwrap().with_stat(Stat::value("ammo", 6.0));
        assert!(matches!(
            feature.add_stat(Stat::value("Ammo", 1.0), None),
            Err(DomainError::Validation(_))
        ));

        let field = feature.add_stat(Stat::value("range", 30.0), Some(0)).unwrap();
        let FeatureField::Stats(stats) = field else {
            panic!("expected stats");
        };
        assert_eq!(stats[0].tag, "range");
        assert_eq!(feature.system.stats.len(), 1);
    }

    #[test]
    fn test_add_stat_strips_color() {
        let feature = Feature::new("Bow").unwrap();
        let field = feature
            .add_stat(Stat::value("ammo", 6.0).with_color(StatColor::Red), None)
            .unwrap();
        assert_eq!(field, FeatureField::Stats(vec![Stat::value("ammo", 6.0)]));
    }

    #[test]
    fn test_update_and_remove_by_query() {
        let mut feature = Feature::new("Bow")
            .unwrap()
            .with_stat(Stat::value("ammo", 6.0))
            .with_stat(Stat::value("range", 30.0));

        let field = feature
            .update_stat(&by_tag("ammo"), &json!({"value": 5, "max": 6, "view": "resource"}))
            .unwrap()
            .unwrap();
        feature.apply(field);
        assert_eq!(feature.system.stats[0].display_text(), "5 / 6");

        assert!(matches!(
            feature.update_stat(&Selector::Index(1), &json!({"tag": "ammo"})),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(feature.update_stat(&by_tag("ghost"), &json!({"value": 1})), Ok(None));

        assert!(feature.remove_stat(&by_tag("ghost")).is_none());
        let field = feature.remove_stat(&Selector::Index(0)).unwrap();
        feature.apply(field);
        assert_eq!(feature.system.stats.len(), 1);
        assert_eq!(feature.system.stats[0].tag, "range");
    }

    #[test]
    fn test_set_category_requires_existing() {
        let owner = owner();
        let feature = Feature::new("Bow").unwrap().owned_by(owner.id);
        assert_eq!(
            feature.set_category("Items", &owner),
            Ok(FeatureField::Category("items".to_string()))
        );
        assert_eq!(
            feature.set_category("", &owner),
            Ok(FeatureField::Category(String::new()))
        );
        assert!(feature.set_category("nope", &owner).is_err());
    }

    #[test]
    fn test_palette_falls_back_through_category() {
        let mut owner = owner();
        let field = owner.set_category_color("items", Some("#ffffff")).unwrap().unwrap();
        owner.apply(field);

        let mut feature = Feature::new("Rope").unwrap().owned_by(owner.id);
        let config = SystemConfig::default();
        assert_eq!(feature.palette(Some(&owner), &config).primary.to_string(), "#000000");

        feature.system.category = "items".to_string();
        assert_eq!(feature.palette(Some(&owner), &config).primary.to_string(), "#ffffff");

        feature.system.color = Some(HexColor::from_rgb(0xff, 0, 0));
        assert_eq!(feature.palette(Some(&owner), &config).primary.to_string(), "#ff0000");
        assert_eq!(feature.palette(None, &config).primary.to_string(), "#ff0000");
    }

    #[test]
    fn test_tracked_stats_use_owner_category() {
        let mut owner = owner();
        let field = owner.add_tracker("items", "uses", StatView::Resource).unwrap().unwrap();
        owner.apply(field);
        let field = owner.add_tracker("items", "weight", StatView::Value).unwrap().unwrap();
        owner.apply(field);

        let mut feature = Feature::new("Rope")
            .unwrap()
            .owned_by(owner.id)
            .with_stat(Stat::resource("uses", 1.0, 2.0));
        let config = SystemConfig::default();
        assert!(feature.tracked_stats(&owner, &config).is_empty());

        feature.system.category = "items".to_string();
        let tracked = feature.tracked_stats(&owner, &config);
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked[0].display_text(), "1 / 2");
        assert_eq!(
            tracked[1],
            TrackedStat::Placeholder {
                tag: "weight".to_string(),
                icon: config.placeholder_icon.clone()
            }
        );
    }

    #[test]
    fn test_owned_context_has_actor_aliases() {
        let owner = owner();
        let feature = Feature::new("Bow").unwrap().with_stat(Stat::value("ammo", 6.0));

        let alone = feature.stat_context();
        assert!(alone.get("actor.might").is_none());

        let owned = feature.with_owner(&owner);
        let context = owned.stat_context();
        assert_eq!(context.get("ammo").unwrap().kind, StatKind::Feature);
        assert_eq!(context.get("actor.might").unwrap().stat.value, Some(3.0));
        assert_eq!(context.get("actor.stat.red").unwrap().stat.tag, "might");
        assert_eq!(context.get("actor.stamina").unwrap().kind, StatKind::Core);

        let data = owned.roll_data();
        assert_eq!(data.get("ammo"), Some(6.0));
        assert_eq!(data.get("actor.stamina"), Some(10.0));
        assert_eq!(data.get("actor.stamina.max"), Some(10.0));
    }

    #[test]
    fn test_set_formula_keeps_usage() {
        let mut feature = Feature::new("Bow").unwrap();
        feature.system.details.usage.multiple = Some(2);
        let FeatureField::Details(details) = feature.set_formula(" 1d8 ") else {
            panic!("expected details");
        };
        assert_eq!(details.formula, "1d8");
        assert_eq!(details.usage.multiple, Some(2));
    }
}
