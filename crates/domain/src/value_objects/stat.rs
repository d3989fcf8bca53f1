//! Stat value object - a single tracked attribute on a character or feature.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StatColor;
use crate::common::{format_number, normalize_key};

/// How a stat renders on the sheet and inside enriched text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatView {
    /// The numeric value alone
    #[default]
    Value,
    /// `value / max`
    Resource,
    /// The label text; numeric fields are ignored
    Label,
}

impl StatView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Resource => "resource",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for StatView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single tagged statistic.
///
/// Numeric fields are optional because host documents may carry blanks;
/// a missing number makes [`Stat::percent`] return NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub tag: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Colour slot, only set on character-owned stats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<StatColor>,
    #[serde(default)]
    pub view: StatView,
    #[serde(default)]
    pub label: String,
}

impl Stat {
    /// A plain numeric stat.
    pub fn value(tag: &str, value: f64) -> Self {
        Self {
            tag: normalize_key(tag),
            value: Some(value),
            max: None,
            color: None,
            view: StatView::Value,
            label: String::new(),
        }
    }

    /// A `value / max` resource stat.
    pub fn resource(tag: &str, value: f64, max: f64) -> Self {
        Self {
            max: Some(max),
            view: StatView::Resource,
            ..Self::value(tag, value)
        }
    }

    /// A label-only stat.
    pub fn label(tag: &str, label: impl Into<String>) -> Self {
        Self {
            value: None,
            view: StatView::Label,
            label: label.into(),
            ..Self::value(tag, 0.0)
        }
    }

    pub fn with_color(self, color: StatColor) -> Self {
        Self {
            color: Some(color),
            ..self
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// Copy with the tag trimmed and lowercased.
    pub fn normalized(self) -> Self {
        Self {
            tag: normalize_key(&self.tag),
            ..self
        }
    }

    /// `value / max`, NaN when either side is missing.
    pub fn percent(&self) -> f64 {
        match (self.value, self.max) {
            (Some(value), Some(max)) => value / max,
            _ => f64::NAN,
        }
    }

    /// Display text according to the view mode.
    ///
    /// ```
    /// use kitsheet_domain::Stat;
    ///
    /// assert_eq!(Stat::resource("stamina", 15.0, 15.0).display_text(), "15 / 15");
    /// assert_eq!(Stat::label("mood", "Grim").display_text(), "Grim");
    /// ```
    pub fn display_text(&self) -> String {
        let number = |n: Option<f64>| n.map(format_number).unwrap_or_default();
        match self.view {
            StatView::Label => self.label.clone(),
            StatView::Value => number(self.value),
            StatView::Resource => format!("{} / {}", number(self.value), number(self.max)),
        }
    }
}
