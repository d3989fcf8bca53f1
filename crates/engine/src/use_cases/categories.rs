//! Category management on a character and the features filed under it.

use std::sync::Arc;

use kitsheet_domain::{
    Character, CharacterField, DomainError, Feature, StatView, SystemConfig,
};

use crate::infrastructure::ports::{DocumentPort, PortError};

#[derive(Debug, thiserror::Error)]
pub enum CategoryOpsError {
    #[error("Category '{category}' already has {max} trackers")]
    TrackerLimit { category: String, max: usize },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

/// A character together with its features after a category change.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEdit {
    pub character: Character,
    pub features: Vec<Feature>,
}

pub struct CategoryOps {
    documents: Arc<dyn DocumentPort>,
    config: Arc<SystemConfig>,
}

impl CategoryOps {
    pub fn new(documents: Arc<dyn DocumentPort>, config: Arc<SystemConfig>) -> Self {
        Self { documents, config }
    }

    pub async fn add(
        &self,
        character: &Character,
        name: &str,
        color: Option<&str>,
    ) -> Result<Character, CategoryOpsError> {
        let field = character.add_category(name, color)?;
        self.write(character, Some(field)).await
    }

    /// Rename a category and re-point the features filed under it.
    ///
    /// The category list is written first, then every affected feature in
    /// one batch.
    pub async fn rename(
        &self,
        character: &Character,
        old: &str,
        new: &str,
        features: &[Feature],
    ) -> Result<CategoryEdit, CategoryOpsError> {
        let Some(rename) = character.rename_category(old, new, features)? else {
            return Ok(CategoryEdit {
                character: character.clone(),
                features: features.to_vec(),
            });
        };

        let feature_updates = rename
            .features
            .iter()
            .map(|(id, field)| Ok((*id, vec![field.to_update()?])))
            .collect::<Result<Vec<_>, DomainError>>()?;

        let updated = self.write(character, Some(rename.categories)).await?;
        if !feature_updates.is_empty() {
            self.documents.update_features(feature_updates).await?;
        }

        let mut features = features.to_vec();
        for (id, field) in rename.features {
            if let Some(feature) = features.iter_mut().find(|f| f.id == id) {
                feature.apply(field);
            }
        }

        tracing::info!(
            character_id = %character.id,
            old = %old,
            new = %new,
            "Category renamed"
        );
        Ok(CategoryEdit {
            character: updated,
            features,
        })
    }

    /// Delete a category and every feature filed under it.
    ///
    /// Features are deleted before the category list is written so no
    /// feature is ever left pointing at a missing category.
    pub async fn delete(
        &self,
        character: &Character,
        name: &str,
        features: &[Feature],
    ) -> Result<CategoryEdit, CategoryOpsError> {
        let Some(deletion) = character.delete_category(name, features) else {
            return Ok(CategoryEdit {
                character: character.clone(),
                features: features.to_vec(),
            });
        };

        if !deletion.features.is_empty() {
            self.documents
                .delete_features(deletion.features.clone())
                .await?;
        }
        let updated = self.write(character, Some(deletion.categories)).await?;

        tracing::info!(
            character_id = %character.id,
            category = %name,
            deleted_features = deletion.features.len(),
            "Category deleted"
        );
        Ok(CategoryEdit {
            character: updated,
            features: features
                .iter()
                .filter(|f| !deletion.features.contains(&f.id))
                .cloned()
                .collect(),
        })
    }

    pub async fn set_color(
        &self,
        character: &Character,
        name: &str,
        color: Option<&str>,
    ) -> Result<Character, CategoryOpsError> {
        let field = character.set_category_color(name, color)?;
        self.write(character, field).await
    }

    pub async fn toggle_collapsed(
        &self,
        character: &Character,
        name: &str,
    ) -> Result<Character, CategoryOpsError> {
        self.write(character, character.toggle_collapsed(name)).await
    }

    /// Append a tracker, refusing once the category holds `max_trackers`.
    pub async fn add_tracker(
        &self,
        character: &Character,
        name: &str,
        tag: &str,
        display_mode: StatView,
    ) -> Result<Character, CategoryOpsError> {
        if let Some(category) = character.category(name) {
            let max = self.config.max_trackers;
            if category.trackers.len() >= max {
                tracing::warn!(
                    character_id = %character.id,
                    category = %category.name,
                    max,
                    "Tracker limit reached"
                );
                return Err(CategoryOpsError::TrackerLimit {
                    category: category.name.clone(),
                    max,
                });
            }
        }

        let field = character.add_tracker(name, tag, display_mode)?;
        self.write(character, field).await
    }

    pub async fn remove_tracker(
        &self,
        character: &Character,
        name: &str,
        tag: &str,
    ) -> Result<Character, CategoryOpsError> {
        self.write(character, character.remove_tracker(name, tag))
            .await
    }

    pub async fn move_tracker(
        &self,
        character: &Character,
        name: &str,
        from: usize,
        to: usize,
    ) -> Result<Character, CategoryOpsError> {
        self.write(character, character.move_tracker(name, from, to))
            .await
    }

    async fn write(
        &self,
        character: &Character,
        field: Option<CharacterField>,
    ) -> Result<Character, CategoryOpsError> {
        let mut updated = character.clone();
        let Some(field) = field else {
            tracing::debug!(
                character_id = %character.id,
                "Category lookup missed, nothing to write"
            );
            return Ok(updated);
        };

        self.documents
            .update_character(character.id, vec![field.to_update()?])
            .await?;
        updated.apply(field);
        Ok(updated)
    }
}
