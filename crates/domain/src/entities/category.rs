//! Category entity - a named grouping of features on a character.

use serde::{Deserialize, Serialize};

use crate::common::normalize_key;
use crate::value_objects::{HexColor, Palette, Stat, TrackedStat, Tracker};
use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Lowercased, unique within the owning character
    pub name: String,
    /// Override for the character's base colour
    #[serde(default)]
    pub color: Option<HexColor>,
    /// Sheet-only fold state
    #[serde(default)]
    pub collapsed: bool,
    /// Stat templates every member feature is expected to expose
    #[serde(default)]
    pub trackers: Vec<Tracker>,
}

impl Category {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let name = normalize_key(name);
        if name.is_empty() {
            return Err(DomainError::validation("Category name cannot be empty"));
        }
        Ok(Self {
            name,
            color: None,
            collapsed: false,
            trackers: Vec::new(),
        })
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_tracker(mut self, tracker: Tracker) -> Self {
        self.trackers.push(tracker);
        self
    }

    /// Palette over the owning character's base colour.
    pub fn palette(&self, base: HexColor) -> Palette {
        Palette::from_colors(base, self.color)
    }

    pub fn has_tracker(&self, tag: &str) -> bool {
        let tag = normalize_key(tag);
        self.trackers.iter().any(|tracker| tracker.tag == tag)
    }

    /// Resolve every tracker against `stats`, in tracker order.
    pub fn tracked_stats(&self, stats: &[Stat], placeholder_icon: &str) -> Vec<TrackedStat> {
        self.trackers
            .iter()
            .map(|tracker| TrackedStat::resolve(tracker, stats, placeholder_icon))
            .collect()
    }
}
