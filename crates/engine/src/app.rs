//! Application state and composition.

use std::sync::Arc;

use kitsheet_domain::SystemConfig;

use crate::infrastructure::ports::{
    ChatPort, ClockPort, DiceEvaluatorPort, DocumentPort, QueryPromptPort, TemplatePort,
};
use crate::use_cases::{CategoryOps, PrepareSheet, RollFeature, StatOps};

/// Host services the engine runs against.
pub struct HostPorts {
    pub documents: Arc<dyn DocumentPort>,
    pub chat: Arc<dyn ChatPort>,
    pub templates: Arc<dyn TemplatePort>,
    pub dice: Arc<dyn DiceEvaluatorPort>,
    pub prompt: Arc<dyn QueryPromptPort>,
    pub clock: Arc<dyn ClockPort>,
}

/// Main application state.
///
/// Holds every use case wired to one set of host ports and one
/// configuration.
pub struct App {
    pub config: Arc<SystemConfig>,
    pub stats: StatOps,
    pub categories: CategoryOps,
    pub sheet: PrepareSheet,
    pub roll: RollFeature,
}

impl App {
    pub fn new(ports: HostPorts, config: SystemConfig) -> Self {
        let config = Arc::new(config);

        Self {
            stats: StatOps::new(ports.documents.clone()),
            categories: CategoryOps::new(ports.documents, config.clone()),
            sheet: PrepareSheet::new(config.clone()),
            roll: RollFeature::new(
                ports.dice,
                ports.prompt,
                ports.templates,
                ports.chat,
                ports.clock,
                config.clone(),
            ),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::dice::BuiltinDiceEvaluator;
    use crate::infrastructure::documents::{JsonFileDocuments, SheetFile};
    use crate::infrastructure::ports::{MockChatPort, MockQueryPromptPort};
    use crate::infrastructure::templates::BuiltinTemplates;
    use crate::use_cases::{RollOptions, RollOutcome};
    use chrono::{TimeZone, Utc};
    use kitsheet_domain::{Character, Feature, Stat, StatColor};

    #[tokio::test]
    async fn edits_persist_and_roll_reads_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let config = SystemConfig::default();
        let character = Character::new("Ash", &config).unwrap();
        let bow = Feature::new("Bow")
            .unwrap()
            .owned_by(character.id)
            .with_formula("1d20 + @actor.might")
            .with_description("Deals @stat[actor.might] damage");
        let sheet = SheetFile {
            character: character.clone(),
            features: vec![bow.clone()],
        };
        tokio::fs::write(&path, serde_json::to_string(&sheet).unwrap())
            .await
            .unwrap();

        let documents = Arc::new(JsonFileDocuments::new(&path));
        let mut chat = MockChatPort::new();
        chat.expect_create_message()
            .times(1)
            .withf(|m| m.roll.as_ref().map(|r| r.total) == Some(23))
            .returning(|_| Ok(()));
        let mut prompt = MockQueryPromptPort::new();
        prompt.expect_prompt().never();

        let app = App::new(
            HostPorts {
                documents: documents.clone(),
                chat: Arc::new(chat),
                templates: Arc::new(BuiltinTemplates::new()),
                dice: Arc::new(BuiltinDiceEvaluator::new(Arc::new(FixedRandom(20)))),
                prompt: Arc::new(prompt),
                clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())),
            },
            config,
        );

        app.stats
            .add_color_stat(&character, Stat::value("might", 3.0), Some(StatColor::Red))
            .await
            .unwrap();
        let stored = documents.load().await.unwrap();

        let outcome = app
            .roll
            .execute(&stored.features[0], Some(&stored.character), RollOptions::default())
            .await
            .unwrap();
        let RollOutcome::Posted(message) = outcome else {
            panic!("roll was cancelled");
        };
        assert!(message.content.contains("kit-crit-success"));
        assert!(message.content.contains("data-stat=\"actor.might\""));
    }
}
