//! Read-only stat lookup table assembled from a character or feature.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::normalize_key;
use crate::value_objects::{RollData, Stat, StatColor};

/// Where a context entry came from. Drives the marker classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "color", rename_all = "camelCase")]
pub enum StatKind {
    /// stamina, proficiency or movement
    Core,
    Color(StatColor),
    Feature,
}

impl StatKind {
    /// CSS classes for an enriched stat span.
    pub fn css_classes(&self) -> String {
        match self {
            Self::Core => "kit-stat kit-stat-core".to_string(),
            Self::Color(color) => format!("kit-stat kit-stat-color kit-stat-{}", color),
            Self::Feature => "kit-stat kit-stat-feature".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextStat {
    pub stat: Stat,
    pub kind: StatKind,
}

/// Stats keyed by lowercase lookup key. One stat may appear under several
/// keys (`might` and `stat.red`, or `actor.might` on an owned feature).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatContext {
    entries: BTreeMap<String, ContextStat>,
}

impl StatContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts under the same key replace earlier ones.
    pub fn insert(&mut self, key: &str, stat: Stat, kind: StatKind) {
        self.entries
            .insert(normalize_key(key), ContextStat { stat, kind });
    }

    pub fn get(&self, key: &str) -> Option<&ContextStat> {
        self.entries.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextStat)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` under `prefix`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: &StatContext) {
        for (key, entry) in &other.entries {
            self.entries.insert(format!("{}{}", prefix, key), entry.clone());
        }
    }

    /// Every numeric value as `key`, every max as `key.max`.
    pub fn roll_data(&self) -> RollData {
        let mut data = RollData::new();
        for (key, entry) in &self.entries {
            if let Some(value) = entry.stat.value.filter(|v| v.is_finite()) {
                data.insert(key.clone(), value);
            }
            if let Some(max) = entry.stat.max.filter(|v| v.is_finite()) {
                data.insert(format!("{}.max", key), max);
            }
        }
        data
    }
}
