//! Stat mutations on characters and features.
//!
//! Each operation asks the entity for a replacement field value, writes it
//! through the [`DocumentPort`] and returns the entity with the field
//! folded back in. Domain rejections happen before anything is written;
//! lookup misses write nothing and return the entity unchanged.

use std::sync::Arc;

use kitsheet_domain::common::Selector;
use kitsheet_domain::{
    Character, CharacterField, CoreStat, DomainError, Feature, FeatureField, Stat, StatColor,
};
use serde_json::Value;

use crate::infrastructure::ports::{DocumentPort, PortError};

#[derive(Debug, thiserror::Error)]
pub enum StatOpsError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

pub struct StatOps {
    documents: Arc<dyn DocumentPort>,
}

impl StatOps {
    pub fn new(documents: Arc<dyn DocumentPort>) -> Self {
        Self { documents }
    }

    // -------------------------------------------------------------------------
    // Character
    // -------------------------------------------------------------------------

    /// Put a stat into `color`, or the first free slot.
    pub async fn add_color_stat(
        &self,
        character: &Character,
        stat: Stat,
        color: Option<StatColor>,
    ) -> Result<Character, StatOpsError> {
        let field = character.add_color_stat(stat, color)?;
        self.write_character(character, Some(field)).await
    }

    pub async fn update_color_stat(
        &self,
        character: &Character,
        tag: &str,
        patch: &Value,
    ) -> Result<Character, StatOpsError> {
        let field = character.update_color_stat(tag, patch)?;
        self.write_character(character, field).await
    }

    /// Move a colour stat; the old slot is cleared in the same write.
    pub async fn reassign_color(
        &self,
        character: &Character,
        tag: &str,
        color: StatColor,
    ) -> Result<Character, StatOpsError> {
        let field = character.reassign_color(tag, color)?;
        self.write_character(character, field).await
    }

    pub async fn remove_color_stat(
        &self,
        character: &Character,
        tag: &str,
    ) -> Result<Character, StatOpsError> {
        self.write_character(character, character.remove_color_stat(tag))
            .await
    }

    pub async fn update_core_stat(
        &self,
        character: &Character,
        core: CoreStat,
        patch: &Value,
    ) -> Result<Character, StatOpsError> {
        let field = character.update_core_stat(core, patch)?;
        self.write_character(character, Some(field)).await
    }

    // -------------------------------------------------------------------------
    // Feature
    // -------------------------------------------------------------------------

    pub async fn add_feature_stat(
        &self,
        feature: &Feature,
        stat: Stat,
        index: Option<usize>,
    ) -> Result<Feature, StatOpsError> {
        let field = feature.add_stat(stat, index)?;
        self.write_feature(feature, Some(field)).await
    }

    pub async fn update_feature_stat(
        &self,
        feature: &Feature,
        selector: &Selector,
        patch: &Value,
    ) -> Result<Feature, StatOpsError> {
        let field = feature.update_stat(selector, patch)?;
        self.write_feature(feature, field).await
    }

    pub async fn remove_feature_stat(
        &self,
        feature: &Feature,
        selector: &Selector,
    ) -> Result<Feature, StatOpsError> {
        self.write_feature(feature, feature.remove_stat(selector))
            .await
    }

    async fn write_character(
        &self,
        character: &Character,
        field: Option<CharacterField>,
    ) -> Result<Character, StatOpsError> {
        let mut updated = character.clone();
        let Some(field) = field else {
            tracing::debug!(character_id = %character.id, "Stat lookup missed, nothing to write");
            return Ok(updated);
        };

        self.documents
            .update_character(character.id, vec![field.to_update()?])
            .await?;
        tracing::info!(
            character_id = %character.id,
            path = field.path(),
            "Character stats updated"
        );
        updated.apply(field);
        Ok(updated)
    }

    async fn write_feature(
        &self,
        feature: &Feature,
        field: Option<FeatureField>,
    ) -> Result<Feature, StatOpsError> {
        let mut updated = feature.clone();
        let Some(field) = field else {
            tracing::debug!(feature_id = %feature.id, "Stat lookup missed, nothing to write");
            return Ok(updated);
        };

        self.documents
            .update_feature(feature.id, vec![field.to_update()?])
            .await?;
        tracing::info!(
            feature_id = %feature.id,
            path = field.path(),
            "Feature stats updated"
        );
        updated.apply(field);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockDocumentPort;
    use kitsheet_domain::common::Query;
    use kitsheet_domain::{StatView, SystemConfig};
    use mockall::predicate::*;
    use serde_json::json;

    fn ash() -> Character {
        Character::new("Ash", &SystemConfig::default()).unwrap()
    }

    fn full_character() -> Character {
        let mut character = ash();
        for (i, color) in StatColor::ALL.into_iter().enumerate() {
            let field = character
                .add_color_stat(Stat::value(&format!("stat{}", i), 1.0), Some(color))
                .unwrap();
            character.apply(field);
        }
        character
    }

    #[tokio::test]
    async fn ninth_color_stat_is_rejected_before_writing() {
        let mut documents = MockDocumentPort::new();
        documents.expect_update_character().never();

        let ops = StatOps::new(Arc::new(documents));
        let result = ops
            .add_color_stat(&full_character(), Stat::value("luck", 2.0), None)
            .await;

        assert!(matches!(
            result,
            Err(StatOpsError::Domain(DomainError::SlotsFull { max: 8 }))
        ));
    }

    #[tokio::test]
    async fn add_color_stat_writes_whole_slot_map() {
        let character = ash();
        let id = character.id;

        let mut documents = MockDocumentPort::new();
        documents
            .expect_update_character()
            .withf(move |got, updates| {
                *got == id && updates.len() == 1 && updates[0].path == "system.colorStats"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let ops = StatOps::new(Arc::new(documents));
        let updated = ops
            .add_color_stat(&character, Stat::value("Might", 3.0), Some(StatColor::Blue))
            .await
            .unwrap();

        assert_eq!(
            updated.system.color_stats.get(StatColor::Blue).map(|s| s.tag.as_str()),
            Some("might")
        );
        assert!(character.system.color_stats.is_empty());
    }

    #[tokio::test]
    async fn reassign_moves_stat_in_one_write() {
        let mut character = ash();
        let field = character
            .add_color_stat(Stat::value("might", 3.0), Some(StatColor::Red))
            .unwrap();
        character.apply(field);

        let mut documents = MockDocumentPort::new();
        documents
            .expect_update_character()
            .times(1)
            .returning(|_, _| Ok(()));

        let ops = StatOps::new(Arc::new(documents));
        let updated = ops
            .reassign_color(&character, "might", StatColor::Green)
            .await
            .unwrap();

        assert!(updated.system.color_stats.is_free(StatColor::Red));
        assert_eq!(updated.system.color_stats.slot_of("might"), Some(StatColor::Green));
    }

    #[tokio::test]
    async fn remove_miss_writes_nothing() {
        let mut documents = MockDocumentPort::new();
        documents.expect_update_character().never();

        let ops = StatOps::new(Arc::new(documents));
        let character = ash();
        let updated = ops.remove_color_stat(&character, "ghost").await.unwrap();
        assert_eq!(updated, character);
    }

    #[tokio::test]
    async fn core_stat_patch_keeps_tag() {
        let mut documents = MockDocumentPort::new();
        documents
            .expect_update_character()
            .withf(|_, updates| updates[0].path == "system.stamina")
            .times(1)
            .returning(|_, _| Ok(()));

        let ops = StatOps::new(Arc::new(documents));
        let updated = ops
            .update_core_stat(&ash(), CoreStat::Stamina, &json!({"tag": "hp", "value": 4}))
            .await
            .unwrap();

        assert_eq!(updated.system.stamina.tag, "stamina");
        assert_eq!(updated.system.stamina.value, Some(4.0));
        assert_eq!(updated.system.stamina.view, StatView::Resource);
    }

    #[tokio::test]
    async fn duplicate_feature_stat_is_rejected() {
        let mut documents = MockDocumentPort::new();
        documents.expect_update_feature().never();

        let feature = Feature::new("Bow").unwrap().with_stat(Stat::value("ammo", 6.0));
        let ops = StatOps::new(Arc::new(documents));
        let result = ops
            .add_feature_stat(&feature, Stat::value("AMMO", 1.0), None)
            .await;
        assert!(matches!(result, Err(StatOpsError::Domain(DomainError::Validation(_)))));
    }

    #[tokio::test]
    async fn feature_stat_update_and_remove() {
        let feature = Feature::new("Bow").unwrap().with_stat(Stat::value("ammo", 6.0));
        let id = feature.id;

        let mut documents = MockDocumentPort::new();
        documents
            .expect_update_feature()
            .with(eq(id), always())
            .times(2)
            .returning(|_, _| Ok(()));

        let ops = StatOps::new(Arc::new(documents));
        let by_tag: Selector = Query::new().field("tag", "ammo").into();

        let updated = ops
            .update_feature_stat(&feature, &by_tag, &json!({"value": 5}))
            .await
            .unwrap();
        assert_eq!(updated.system.stats[0].value, Some(5.0));

        let removed = ops.remove_feature_stat(&updated, &by_tag).await.unwrap();
        assert!(removed.system.stats.is_empty());
    }

    #[tokio::test]
    async fn port_failure_is_reported() {
        let mut documents = MockDocumentPort::new();
        documents
            .expect_update_feature()
            .returning(|id, _| Err(PortError::not_found("Feature", id)));

        let ops = StatOps::new(Arc::new(documents));
        let feature = Feature::new("Bow").unwrap();
        let result = ops
            .add_feature_stat(&feature, Stat::value("ammo", 6.0), None)
            .await;
        assert!(matches!(result, Err(StatOpsError::Port(e)) if e.is_not_found()));
    }
}
