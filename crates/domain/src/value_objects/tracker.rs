//! Category trackers and the stats they resolve to on a feature.

use serde::{Deserialize, Serialize};

use super::{Stat, StatView};
use crate::common::normalize_key;

/// A category-level template: every feature in the category is expected
/// to expose a stat with this tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    pub tag: String,
    #[serde(default)]
    pub display_mode: StatView,
}

impl Tracker {
    pub fn new(tag: &str, display_mode: StatView) -> Self {
        Self {
            tag: normalize_key(tag),
            display_mode,
        }
    }
}

/// A tracker resolved against one feature. Never absent: a missing stat
/// becomes a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TrackedStat {
    Present {
        stat: Stat,
        display_mode: StatView,
    },
    Placeholder {
        tag: String,
        icon: String,
    },
}

impl TrackedStat {
    /// Resolve `tracker` against a feature's stats.
    pub fn resolve(tracker: &Tracker, stats: &[Stat], placeholder_icon: &str) -> Self {
        match stats.iter().find(|stat| stat.tag == tracker.tag) {
            Some(stat) => Self::Present {
                stat: stat.clone(),
                display_mode: tracker.display_mode,
            },
            None => Self::Placeholder {
                tag: tracker.tag.clone(),
                icon: placeholder_icon.to_string(),
            },
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Present { stat, .. } => &stat.tag,
            Self::Placeholder { tag, .. } => tag,
        }
    }

    /// Placeholders always render as a blank value.
    pub fn view(&self) -> StatView {
        match self {
            Self::Present { display_mode, .. } => *display_mode,
            Self::Placeholder { .. } => StatView::Value,
        }
    }

    /// Text shown in the tracker column, using the tracker's display mode.
    pub fn display_text(&self) -> String {
        match self {
            Self::Present { stat, display_mode } => Stat {
                view: *display_mode,
                ..stat.clone()
            }
            .display_text(),
            Self::Placeholder { .. } => String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_present_uses_tracker_display_mode() {
        let tracker = Tracker::new("Uses", StatView::Resource);
        let stats = vec![Stat::value("uses", 2.0), Stat::value("range", 30.0)];
        let mut with_max = stats.clone();
        with_max[0].max = Some(3.0);

        let tracked = TrackedStat::resolve(&tracker, &with_max, "fas fa-question");
        assert!(!tracked.is_placeholder());
        assert_eq!(tracked.view(), StatView::Resource);
        assert_eq!(tracked.display_text(), "2 / 3");
    }

    #[test]
    fn test_resolve_missing_yields_placeholder() {
        let tracker = Tracker::new("charges", StatView::Value);
        let tracked = TrackedStat::resolve(&tracker, &[], "fas fa-question");
        assert_eq!(
            tracked,
            TrackedStat::Placeholder {
                tag: "charges".to_string(),
                icon: "fas fa-question".to_string()
            }
        );
        assert_eq!(tracked.display_text(), "");
        assert_eq!(tracked.view(), StatView::Value);
        assert_eq!(tracked.tag(), "charges");
    }
}
