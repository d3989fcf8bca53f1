//! System configuration value object
//!
//! Replaces ambient registry lookups: colour tables, seeded categories and
//! the localisation table are passed explicitly to every component that
//! needs them.
//!
//! Deserialization is lenient (`#[serde(default)]`) so partial overrides
//! from a config file layer over [`SystemConfig::default`]. Call
//! [`SystemConfig::normalized`] after loading to restore any colour slot
//! the override left out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{HexColor, StatColor};

/// Keys into [`SystemConfig::labels`].
pub mod label_keys {
    pub const CRIT_SUCCESS: &str = "roll_crit_success";
    pub const CRIT_FAILURE: &str = "roll_crit_failure";
    pub const ROLL_FLAVOR: &str = "roll_flavor";
    pub const UNKNOWN_STAT: &str = "stat_unknown";
    pub const UNCATEGORIZED: &str = "category_uncategorized";
    pub const QUERY_TITLE: &str = "query_title";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Hex swatch for each colour slot
    pub colors: BTreeMap<StatColor, HexColor>,
    /// Base colour for new characters
    pub default_color: HexColor,
    /// Categories seeded on new characters
    pub default_categories: Vec<String>,
    /// Soft limit on trackers per category (sheet rule, not a schema rule)
    pub max_trackers: usize,
    /// Icon shown for a tracked stat a feature does not carry
    pub placeholder_icon: String,
    /// Localised templates with `{name}` substitutions
    pub labels: BTreeMap<String, String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let labels = [
            (label_keys::CRIT_SUCCESS, "Critical Success!"),
            (label_keys::CRIT_FAILURE, "Critical Failure!"),
            (label_keys::ROLL_FLAVOR, "{feature} ({character})"),
            (label_keys::UNKNOWN_STAT, "Unknown stat: {tag}"),
            (label_keys::UNCATEGORIZED, "Uncategorized"),
            (label_keys::QUERY_TITLE, "{feature}: answer before rolling"),
        ];

        Self {
            colors: StatColor::ALL
                .into_iter()
                .map(|color| (color, color.default_hex()))
                .collect(),
            default_color: HexColor::from_rgb(0x4a, 0x4a, 0x68),
            default_categories: vec![
                "abilities".to_string(),
                "items".to_string(),
                "traits".to_string(),
            ],
            max_trackers: 4,
            placeholder_icon: "fas fa-circle-question".to_string(),
            labels: labels
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl SystemConfig {
    /// Fill colour slots and labels an override left out with the defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        for (color, hex) in defaults.colors {
            self.colors.entry(color).or_insert(hex);
        }
        for (key, value) in defaults.labels {
            self.labels.entry(key).or_insert(value);
        }
        self
    }

    /// Swatch for a colour slot.
    pub fn color_hex(&self, color: StatColor) -> HexColor {
        self.colors
            .get(&color)
            .copied()
            .unwrap_or_else(|| color.default_hex())
    }

    /// Raw label template, or the key itself when missing.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Label with `{name}` placeholders substituted.
    ///
    /// ```
    /// use kitsheet_domain::SystemConfig;
    ///
    /// let config = SystemConfig::default();
    /// assert_eq!(config.format("stat_unknown", &[("tag", "hp")]), "Unknown stat: hp");
    /// ```
    pub fn format(&self, key: &str, substitutions: &[(&str, &str)]) -> String {
        substitutions
            .iter()
            .fold(self.label(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_complete() {
        let config = SystemConfig::default();
        assert_eq!(config.colors.len(), 8);
        assert_eq!(config.max_trackers, 4);
        assert_eq!(config.default_categories.len(), 3);
        assert_eq!(config.label(label_keys::CRIT_SUCCESS), "Critical Success!");
    }

    #[test]
    fn test_missing_label_falls_back_to_key() {
        let config = SystemConfig::default();
        assert_eq!(config.label("nope"), "nope");
        assert_eq!(config.format("nope", &[("a", "b")]), "nope");
    }

    #[test]
    fn test_format_substitutes_every_placeholder() {
        let config = SystemConfig::default();
        assert_eq!(
            config.format(
                label_keys::ROLL_FLAVOR,
                &[("feature", "Fireball"), ("character", "Ash")]
            ),
            "Fireball (Ash)"
        );
    }

    #[test]
    fn test_partial_override_is_normalized() {
        let partial: SystemConfig =
            serde_json::from_str(r##"{"colors": {"red": "#aa0000"}, "max_trackers": 6}"##).unwrap();
        assert_eq!(partial.colors.len(), 1);

        let config = partial.normalized();
        assert_eq!(config.colors.len(), 8);
        assert_eq!(config.color_hex(StatColor::Red).to_string(), "#aa0000");
        assert_eq!(config.color_hex(StatColor::Blue), StatColor::Blue.default_hex());
        assert_eq!(config.max_trackers, 6);
        assert_eq!(config.label(label_keys::UNCATEGORIZED), "Uncategorized");
    }
}
