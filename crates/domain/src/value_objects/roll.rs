//! Pure pieces of the roll protocol: formula planning and crit classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DiceExpression;
use crate::common::none_if_blank;

/// Formula used for bookkeeping when a roll is forced to post-only.
pub const FALLBACK_FORMULA: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CritKind {
    Success,
    Failure,
}

impl CritKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for CritKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify an actual total against the maximized and minimized totals.
///
/// Deterministic formulas never crit. When max and min coincide the
/// success branch wins.
pub fn classify_crit(actual: i64, max: i64, min: i64, deterministic: bool) -> Option<CritKind> {
    if deterministic {
        None
    } else if actual == max {
        Some(CritKind::Success)
    } else if actual == min {
        Some(CritKind::Failure)
    } else {
        None
    }
}

/// What the roll protocol will do with a feature's configured formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollPlan {
    /// Formula to evaluate, or [`FALLBACK_FORMULA`] when forced to post
    pub formula: String,
    /// Skip evaluation and broadcast flat content
    pub post: bool,
    /// The configured formula was empty or invalid
    pub forced: bool,
}

impl RollPlan {
    /// Decide between evaluating and posting.
    ///
    /// An empty or syntactically invalid formula forces `post`, whatever
    /// the caller asked for.
    ///
    /// ```
    /// use kitsheet_domain::RollPlan;
    ///
    /// let plan = RollPlan::from_formula("", false);
    /// assert!(plan.post);
    /// assert_eq!(plan.formula, "1");
    ///
    /// let plan = RollPlan::from_formula("1d20 + @might", false);
    /// assert!(!plan.post);
    /// ```
    pub fn from_formula(formula: &str, post_requested: bool) -> Self {
        match none_if_blank(formula).filter(|f| DiceExpression::is_valid(f)) {
            Some(valid) => Self {
                formula: valid.to_string(),
                post: post_requested,
                forced: false,
            },
            None => Self {
                formula: FALLBACK_FORMULA.to_string(),
                post: true,
                forced: true,
            },
        }
    }

    /// True when the plan came from a bad formula rather than a request.
    pub fn is_fallback(&self) -> bool {
        self.forced
    }
}
