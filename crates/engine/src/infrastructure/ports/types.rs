//! Data carried across the host ports.

use chrono::{DateTime, Utc};
use kitsheet_domain::{CharacterId, CritKind, FeatureId};
use serde::{Deserialize, Serialize};

/// Who a chat message is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSpeaker {
    pub character: Option<CharacterId>,
    pub feature: FeatureId,
    /// Display name shown in the chat log
    pub alias: String,
}

/// The evaluated roll attached to a non-post message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollSummary {
    /// Formula with references resolved
    pub formula: String,
    pub total: i64,
    /// Per-die faces, shown as a tooltip
    pub breakdown: String,
    pub crit: Option<CritKind>,
}

/// A message handed to the host's broadcast primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub speaker: ChatSpeaker,
    pub flavor: String,
    /// Rendered HTML card
    pub content: String,
    /// Formula as configured, or the fallback when posting
    pub formula: String,
    pub roll: Option<RollSummary>,
    pub post: bool,
    pub timestamp: DateTime<Utc>,
}
