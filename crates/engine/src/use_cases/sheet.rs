//! Sheet preparation.
//!
//! Builds the render context handed to the host's sheet templates. Every
//! call starts from the documents as given: palettes, tracked stats and
//! query descriptors are derived fresh, nothing is cached between calls.

use std::sync::Arc;

use kitsheet_domain::{
    label_keys, Category, Character, CharacterId, ClassLevel, CoreStat, Enriched, Enricher,
    Feature, FeatureId, Palette, QueryDescriptor, Stat, StatColor, SystemConfig, TrackedStat,
    Tracker,
};
use serde::Serialize;

/// One row in a category section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRow {
    pub id: FeatureId,
    pub name: String,
    pub palette: Palette,
    /// One entry per category tracker, in tracker order
    pub tracked: Vec<TrackedStat>,
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySection {
    /// Stored name, empty for the uncategorized section
    pub name: String,
    /// Heading shown on the sheet
    pub label: String,
    pub collapsed: bool,
    pub palette: Palette,
    pub trackers: Vec<Tracker>,
    pub features: Vec<FeatureRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheet {
    pub id: CharacterId,
    pub name: String,
    pub palette: Palette,
    pub class_level: ClassLevel,
    pub core: Vec<Stat>,
    pub color_stats: Vec<(StatColor, Stat)>,
    pub biography: Enriched,
    /// Category sections in category order, uncategorized last
    pub sections: Vec<CategorySection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSheet {
    pub id: FeatureId,
    pub name: String,
    pub palette: Palette,
    pub category: String,
    pub stats: Vec<Stat>,
    pub tracked: Vec<TrackedStat>,
    pub formula: String,
    pub description: Enriched,
}

impl FeatureSheet {
    /// Queries captured while enriching the description.
    pub fn queries(&self) -> &[QueryDescriptor] {
        &self.description.queries
    }
}

pub struct PrepareSheet {
    config: Arc<SystemConfig>,
}

impl PrepareSheet {
    pub fn new(config: Arc<SystemConfig>) -> Self {
        Self { config }
    }

    pub fn character(&self, character: &Character, features: &[Feature]) -> CharacterSheet {
        let biography = Enricher::for_character(character, &self.config)
            .enrich(&character.system.biography);
        warn_dangling("character", &character.name, &biography);

        let owned: Vec<&Feature> = features
            .iter()
            .filter(|f| f.owner == Some(character.id))
            .collect();

        let mut sections: Vec<CategorySection> = character
            .system
            .categories
            .iter()
            .map(|category| {
                let rows = owned
                    .iter()
                    .filter(|f| f.system.category == category.name)
                    .map(|f| self.row(f, character))
                    .collect();
                self.section(character, category, rows)
            })
            .collect();

        // Features filed under a category the character no longer has
        // land here too.
        let loose: Vec<FeatureRow> = owned
            .iter()
            .filter(|f| !f.is_categorized() || character.category(&f.system.category).is_none())
            .map(|f| self.row(f, character))
            .collect();
        if !loose.is_empty() {
            sections.push(CategorySection {
                name: String::new(),
                label: self.config.label(label_keys::UNCATEGORIZED).to_string(),
                collapsed: false,
                palette: character.palette(),
                trackers: Vec::new(),
                features: loose,
            });
        }

        tracing::debug!(
            character_id = %character.id,
            sections = sections.len(),
            features = owned.len(),
            "Prepared character sheet"
        );

        CharacterSheet {
            id: character.id,
            name: character.name.clone(),
            palette: character.palette(),
            class_level: character.class_level(),
            core: CoreStat::ALL
                .into_iter()
                .map(|core| character.core_stat(core).clone())
                .collect(),
            color_stats: character
                .system
                .color_stats
                .occupied()
                .map(|(color, stat)| (color, stat.clone()))
                .collect(),
            biography,
            sections,
        }
    }

    pub fn feature(&self, feature: &Feature, owner: Option<&Character>) -> FeatureSheet {
        let description = Enricher::for_feature(feature, owner, &self.config)
            .enrich(&feature.system.description);
        warn_dangling("feature", &feature.name, &description);

        tracing::debug!(
            feature_id = %feature.id,
            queries = description.queries.len(),
            "Prepared feature sheet"
        );

        FeatureSheet {
            id: feature.id,
            name: feature.name.clone(),
            palette: feature.palette(owner, &self.config),
            category: feature.system.category.clone(),
            stats: feature.system.stats.clone(),
            tracked: owner
                .map(|owner| feature.tracked_stats(owner, &self.config))
                .unwrap_or_default(),
            formula: feature.system.details.formula.clone(),
            description,
        }
    }

    fn row(&self, feature: &Feature, owner: &Character) -> FeatureRow {
        FeatureRow {
            id: feature.id,
            name: feature.name.clone(),
            palette: feature.palette(Some(owner), &self.config),
            tracked: feature.tracked_stats(owner, &self.config),
            formula: feature.system.details.formula.clone(),
        }
    }

    fn section(
        &self,
        owner: &Character,
        category: &Category,
        features: Vec<FeatureRow>,
    ) -> CategorySection {
        CategorySection {
            name: category.name.clone(),
            label: category.name.clone(),
            collapsed: category.collapsed,
            palette: category.palette(owner.system.color),
            trackers: category.trackers.clone(),
            features,
        }
    }
}

fn warn_dangling(kind: &'static str, name: &str, enriched: &Enriched) {
    if !enriched.invalid_tags.is_empty() {
        tracing::warn!(
            document = kind,
            name = %name,
            tags = ?enriched.invalid_tags,
            "Text references unknown stats"
        );
    }
}
