//! Character entity - the root document of a sheet
//!
//! A character carries three always-present core stats, up to eight
//! colour-keyed stats, an ordered list of categories and free-text
//! classification fields. Every mutation returns a replacement value for
//! the top-level field it touches ([`CharacterField`]) and leaves `self`
//! alone; callers persist the value and then [`Character::apply`] it.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

use crate::common::sequence::{self, Query, Selector};
use crate::common::normalize_key;
use crate::enrichment::{StatContext, StatKind};
use crate::entities::{Category, Feature};
use crate::stat_container::{ensure_unique_tag, validate_stat, StatContainer};
use crate::updates::{CategoryDeletion, CategoryRename, CharacterField, FeatureField};
use crate::value_objects::{HexColor, Palette, Stat, StatColor, StatView, SystemConfig, Tracker};
use crate::{CharacterId, DomainError};

// =============================================================================
// Core stats
// =============================================================================

/// The three stats every character always has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreStat {
    Stamina,
    Proficiency,
    Movement,
}

impl CoreStat {
    pub const ALL: [CoreStat; 3] = [Self::Stamina, Self::Proficiency, Self::Movement];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stamina => "stamina",
            Self::Proficiency => "proficiency",
            Self::Movement => "movement",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = normalize_key(tag);
        Self::ALL.into_iter().find(|core| core.as_str() == tag)
    }

    /// Schema default for a freshly created character.
    pub fn default_stat(&self) -> Stat {
        match self {
            Self::Stamina => Stat::resource("stamina", 10.0, 10.0),
            Self::Proficiency => Stat::value("proficiency", 0.0),
            Self::Movement => Stat::value("movement", 5.0),
        }
    }
}

impl fmt::Display for CoreStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Class level
// =============================================================================

/// Roman-numeral tier derived from proficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassLevel {
    #[serde(rename = "I")]
    One,
    #[serde(rename = "II")]
    Two,
    #[serde(rename = "III")]
    Three,
}

impl ClassLevel {
    /// `<60` is I, `60..100` is II, `>=100` is III. A missing value counts as 0.
    pub fn from_proficiency(value: Option<f64>) -> Self {
        let value = value.unwrap_or(0.0);
        if value >= 100.0 {
            Self::Three
        } else if value >= 60.0 {
            Self::Two
        } else {
            Self::One
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "I",
            Self::Two => "II",
            Self::Three => "III",
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Colour slots
// =============================================================================

/// The eight colour slots. Always serialized with every key present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<StatColor, Option<Stat>>",
    into = "BTreeMap<StatColor, Option<Stat>>"
)]
pub struct ColorStats {
    slots: BTreeMap<StatColor, Option<Stat>>,
}

impl Default for ColorStats {
    fn default() -> Self {
        Self {
            slots: StatColor::ALL.into_iter().map(|color| (color, None)).collect(),
        }
    }
}

impl From<BTreeMap<StatColor, Option<Stat>>> for ColorStats {
    fn from(map: BTreeMap<StatColor, Option<Stat>>) -> Self {
        map.into_iter()
            .fold(Self::default(), |slots, (color, stat)| slots.with(color, stat))
    }
}

impl From<ColorStats> for BTreeMap<StatColor, Option<Stat>> {
    fn from(stats: ColorStats) -> Self {
        stats.slots
    }
}

impl ColorStats {
    pub const CAPACITY: usize = StatColor::ALL.len();

    pub fn get(&self, color: StatColor) -> Option<&Stat> {
        self.slots.get(&color).and_then(Option::as_ref)
    }

    pub fn is_free(&self, color: StatColor) -> bool {
        self.get(color).is_none()
    }

    /// Slot currently holding `tag`.
    pub fn slot_of(&self, tag: &str) -> Option<StatColor> {
        let tag = normalize_key(tag);
        self.occupied()
            .find(|(_, stat)| stat.tag == tag)
            .map(|(color, _)| color)
    }

    /// Occupied slots in display order.
    pub fn occupied(&self) -> impl Iterator<Item = (StatColor, &Stat)> {
        self.slots
            .iter()
            .filter_map(|(color, stat)| stat.as_ref().map(|stat| (*color, stat)))
    }

    pub fn len(&self) -> usize {
        self.occupied().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= Self::CAPACITY
    }

    pub fn first_free(&self) -> Option<StatColor> {
        StatColor::ALL.into_iter().find(|color| self.is_free(*color))
    }

    /// Copy with one slot replaced. The stored stat is stamped with its slot.
    pub fn with(&self, color: StatColor, stat: Option<Stat>) -> Self {
        let mut slots = self.slots.clone();
        slots.insert(color, stat.map(|stat| stat.with_color(color)));
        Self { slots }
    }
}

// =============================================================================
// Character
// =============================================================================

fn default_stamina() -> Stat {
    CoreStat::Stamina.default_stat()
}

fn default_proficiency() -> Stat {
    CoreStat::Proficiency.default_stat()
}

fn default_movement() -> Stat {
    CoreStat::Movement.default_stat()
}

fn default_color() -> HexColor {
    SystemConfig::default().default_color
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    #[serde(default = "default_stamina")]
    pub stamina: Stat,
    #[serde(default = "default_proficiency")]
    pub proficiency: Stat,
    #[serde(default = "default_movement")]
    pub movement: Stat,
    #[serde(default)]
    pub color_stats: ColorStats,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Rich text
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub word: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default = "default_color")]
    pub color: HexColor,
}

/// A character sheet document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub system: CharacterData,
}

impl Character {
    /// A new character with schema defaults and the configured categories.
    pub fn new(name: &str, config: &SystemConfig) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }

        let categories = config
            .default_categories
            .iter()
            .filter_map(|name| Category::new(name).ok())
            .fold(Vec::<Category>::new(), |mut seeded, category| {
                if !seeded.iter().any(|c| c.name == category.name) {
                    seeded.push(category);
                }
                seeded
            });

        Ok(Self {
            id: CharacterId::new(),
            name: name.to_string(),
            system: CharacterData {
                stamina: default_stamina(),
                proficiency: default_proficiency(),
                movement: default_movement(),
                color_stats: ColorStats::default(),
                categories,
                biography: String::new(),
                class: String::new(),
                word: String::new(),
                kind: String::new(),
                color: config.default_color,
            },
        })
    }

    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.system.biography = biography.into();
        self
    }

    pub fn class_level(&self) -> ClassLevel {
        ClassLevel::from_proficiency(self.system.proficiency.value)
    }

    pub fn palette(&self) -> Palette {
        Palette::from_colors(self.system.color, None)
    }

    pub fn core_stat(&self, core: CoreStat) -> &Stat {
        match core {
            CoreStat::Stamina => &self.system.stamina,
            CoreStat::Proficiency => &self.system.proficiency,
            CoreStat::Movement => &self.system.movement,
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        let name = normalize_key(name);
        self.system.categories.iter().find(|c| c.name == name)
    }

    /// Fold a persisted field back into the model.
    pub fn apply(&mut self, field: CharacterField) {
        match field {
            CharacterField::Name(name) => self.name = name,
            CharacterField::Core(CoreStat::Stamina, stat) => self.system.stamina = stat,
            CharacterField::Core(CoreStat::Proficiency, stat) => self.system.proficiency = stat,
            CharacterField::Core(CoreStat::Movement, stat) => self.system.movement = stat,
            CharacterField::ColorStats(stats) => self.system.color_stats = stats,
            CharacterField::Categories(categories) => self.system.categories = categories,
            CharacterField::Biography(text) => self.system.biography = text,
            CharacterField::Class(text) => self.system.class = text,
            CharacterField::Word(text) => self.system.word = text,
            CharacterField::Kind(text) => self.system.kind = text,
            CharacterField::Color(color) => self.system.color = color,
        }
    }

    pub fn set_color(&self, hex: &str) -> Result<CharacterField, DomainError> {
        Ok(CharacterField::Color(HexColor::parse(hex)?))
    }

    // -------------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------------

    /// Put a stat into a colour slot, or the first free one.
    ///
    /// # Errors
    ///
    /// - `SlotsFull` when all eight slots are taken
    /// - `Validation` for blank, malformed, reserved or duplicate tags
    /// - `Constraint` when the requested slot is occupied
    pub fn add_color_stat(
        &self,
        stat: Stat,
        color: Option<StatColor>,
    ) -> Result<CharacterField, DomainError> {
        let stats = &self.system.color_stats;
        if stats.is_full() {
            return Err(DomainError::slots_full(ColorStats::CAPACITY));
        }

        let stat = validate_stat(stat)?;
        ensure_not_core(&stat.tag)?;
        ensure_unique_tag(stats.occupied().map(|(_, s)| s.tag.as_str()), &stat.tag)?;

        let slot = match color {
            Some(color) => {
                if let Some(holder) = stats.get(color) {
                    return Err(DomainError::constraint(format!(
                        "The {} slot is already taken by '{}'",
                        color, holder.tag
                    )));
                }
                color
            }
            None => stats
                .first_free()
                .ok_or_else(|| DomainError::slots_full(ColorStats::CAPACITY))?,
        };

        Ok(CharacterField::ColorStats(stats.with(slot, Some(stat))))
    }

    /// Deep-merge `patch` onto the colour stat tagged `tag`. The stat keeps
    /// its slot; use [`Character::reassign_color`] to move it.
    pub fn update_color_stat(
        &self,
        tag: &str,
        patch: &serde_json::Value,
    ) -> Result<Option<CharacterField>, DomainError> {
        let stats = &self.system.color_stats;
        let Some((slot, current)) = stats
            .slot_of(tag)
            .and_then(|slot| stats.get(slot).map(|stat| (slot, stat)))
        else {
            return Ok(None);
        };

        let updated = validate_stat(sequence::merge_record(current, patch)?)?;
        if updated.tag != current.tag {
            ensure_not_core(&updated.tag)?;
            ensure_unique_tag(
                stats
                    .occupied()
                    .filter(|(color, _)| *color != slot)
                    .map(|(_, s)| s.tag.as_str()),
                &updated.tag,
            )?;
        }

        Ok(Some(CharacterField::ColorStats(stats.with(slot, Some(updated)))))
    }

    /// Move a colour stat to another slot, clearing the old slot in the
    /// same replacement value.
    pub fn reassign_color(
        &self,
        tag: &str,
        color: StatColor,
    ) -> Result<Option<CharacterField>, DomainError> {
        let stats = &self.system.color_stats;
        let Some((from, stat)) = stats
            .slot_of(tag)
            .and_then(|slot| stats.get(slot).map(|stat| (slot, stat.clone())))
        else {
            return Ok(None);
        };
        if from == color {
            return Ok(None);
        }
        if let Some(holder) = stats.get(color) {
            return Err(DomainError::constraint(format!(
                "The {} slot is already taken by '{}'",
                color, holder.tag
            )));
        }

        Ok(Some(CharacterField::ColorStats(
            stats.with(from, None).with(color, Some(stat)),
        )))
    }

    /// `None` when no colour stat carries `tag`.
    pub fn remove_color_stat(&self, tag: &str) -> Option<CharacterField> {
        let stats = &self.system.color_stats;
        stats
            .slot_of(tag)
            .map(|slot| CharacterField::ColorStats(stats.with(slot, None)))
    }

    /// Deep-merge `patch` onto a core stat. The tag cannot change.
    pub fn update_core_stat(
        &self,
        core: CoreStat,
        patch: &serde_json::Value,
    ) -> Result<CharacterField, DomainError> {
        let mut updated: Stat = sequence::merge_record(self.core_stat(core), patch)?;
        updated.tag = core.as_str().to_string();
        updated.color = None;
        Ok(CharacterField::Core(core, updated))
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub fn add_category(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<CharacterField, DomainError> {
        let mut category = Category::new(name)?;
        category.color = color.map(HexColor::parse).transpose()?;
        self.ensure_category_free(&category.name)?;

        Ok(CharacterField::Categories(sequence::add(
            &self.system.categories,
            category,
            None,
        )))
    }

    /// Rename a category and re-point every owned feature at the new name.
    ///
    /// `None` when `old` does not exist or the name does not change.
    pub fn rename_category(
        &self,
        old: &str,
        new: &str,
        features: &[Feature],
    ) -> Result<Option<CategoryRename>, DomainError> {
        let old = normalize_key(old);
        let new = Category::new(new)?.name;
        if self.category(&old).is_none() || old == new {
            return Ok(None);
        }
        self.ensure_category_free(&new)?;

        let categories = sequence::set(
            &self.system.categories,
            &category_selector(&old),
            &json!({ "name": new }),
        )?;
        let features = self
            .members_of(&old, features)
            .map(|feature| (feature.id, FeatureField::Category(new.clone())))
            .collect();

        Ok(Some(CategoryRename {
            categories: CharacterField::Categories(categories),
            features,
        }))
    }

    /// Remove a category and collect the owned features filed under it.
    ///
    /// The features must be deleted before the categories value is
    /// written. `None` when the category does not exist.
    pub fn delete_category(&self, name: &str, features: &[Feature]) -> Option<CategoryDeletion> {
        let name = normalize_key(name);
        self.category(&name)?;

        Some(CategoryDeletion {
            categories: CharacterField::Categories(sequence::remove(
                &self.system.categories,
                &category_selector(&name),
            )),
            features: self.members_of(&name, features).map(|f| f.id).collect(),
        })
    }

    pub fn set_category_color(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> Result<Option<CharacterField>, DomainError> {
        let color = color.map(HexColor::parse).transpose()?;
        Ok(self.update_category(name, |category| category.color = color))
    }

    pub fn toggle_collapsed(&self, name: &str) -> Option<CharacterField> {
        self.update_category(name, |category| category.collapsed = !category.collapsed)
    }

    /// Append a tracker. The soft limit on tracker count is not checked here.
    pub fn add_tracker(
        &self,
        name: &str,
        tag: &str,
        display_mode: StatView,
    ) -> Result<Option<CharacterField>, DomainError> {
        let tracker = Tracker::new(tag, display_mode);
        if tracker.tag.is_empty() {
            return Err(DomainError::validation("Tracker tag cannot be empty"));
        }
        let Some(category) = self.category(name) else {
            return Ok(None);
        };
        if category.has_tracker(&tracker.tag) {
            return Err(DomainError::validation(format!(
                "Category '{}' already tracks '{}'",
                category.name, tracker.tag
            )));
        }
        Ok(self.update_category(name, |category| category.trackers.push(tracker)))
    }

    pub fn remove_tracker(&self, name: &str, tag: &str) -> Option<CharacterField> {
        let selector: Selector = Query::new().field("tag", normalize_key(tag)).into();
        if !sequence::has(&self.category(name)?.trackers, &selector) {
            return None;
        }
        self.update_category(name, |category| {
            category.trackers = sequence::remove(&category.trackers, &selector);
        })
    }

    /// Move the tracker at `from` to `to` (clamped to the end).
    pub fn move_tracker(&self, name: &str, from: usize, to: usize) -> Option<CharacterField> {
        let tracker = self.category(name)?.trackers.get(from)?.clone();
        self.update_category(name, |category| {
            let rest = sequence::remove(&category.trackers, &Selector::Index(from));
            category.trackers = sequence::add(&rest, tracker, Some(to));
        })
    }

    fn update_category<F>(&self, name: &str, change: F) -> Option<CharacterField>
    where
        F: FnOnce(&mut Category),
    {
        let index = sequence::index_of(&self.system.categories, &category_selector(name))?;
        let mut categories = self.system.categories.clone();
        change(&mut categories[index]);
        Some(CharacterField::Categories(categories))
    }

    fn ensure_category_free(&self, name: &str) -> Result<(), DomainError> {
        if self.category(name).is_some() {
            return Err(DomainError::validation(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn members_of<'a>(
        &'a self,
        category: &'a str,
        features: &'a [Feature],
    ) -> impl Iterator<Item = &'a Feature> + 'a {
        features
            .iter()
            .filter(move |f| f.owner == Some(self.id) && f.system.category == category)
    }
}

fn category_selector(name: &str) -> Selector {
    Query::new().field("name", normalize_key(name)).into()
}

fn ensure_not_core(tag: &str) -> Result<(), DomainError> {
    match CoreStat::from_tag(tag) {
        Some(core) => Err(DomainError::validation(format!(
            "'{}' is reserved for a core stat",
            core
        ))),
        None => Ok(()),
    }
}

impl StatContainer for Character {
    fn owned_stats(&self) -> Vec<&Stat> {
        CoreStat::ALL
            .iter()
            .map(|core| self.core_stat(*core))
            .chain(self.system.color_stats.occupied().map(|(_, stat)| stat))
            .collect()
    }

    /// Core stats by name, colour stats by tag and by `stat.<color>`.
    fn stat_context(&self) -> StatContext {
        let mut context = StatContext::new();
        for core in CoreStat::ALL {
            context.insert(core.as_str(), self.core_stat(core).clone(), StatKind::Core);
        }
        for (color, stat) in self.system.color_stats.occupied() {
            context.insert(&stat.tag, stat.clone(), StatKind::Color(color));
            context.insert(
                &format!("stat.{}", color),
                stat.clone(),
                StatKind::Color(color),
            );
        }
        context
    }
}
