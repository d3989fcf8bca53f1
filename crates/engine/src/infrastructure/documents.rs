//! JSON sheet file document store.
//!
//! Holds one character and its features in a single file:
//!
//! ```json
//! { "character": { ... }, "features": [ { ... } ] }
//! ```
//!
//! Updates set each dot-path to its replacement value and rewrite the
//! file. Writes are serialized through a mutex.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kitsheet_domain::{Character, CharacterId, Feature, FeatureId, FieldUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{DocumentPort, PortError};

/// The typed view of a sheet file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetFile {
    pub character: Character,
    #[serde(default)]
    pub features: Vec<Feature>,
}

pub struct JsonFileDocuments {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileDocuments {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the whole file.
    pub async fn load(&self) -> Result<SheetFile, PortError> {
        let raw = self.read_raw().await?;
        Ok(serde_json::from_value(raw)?)
    }

    async fn read_raw(&self) -> Result<Value, PortError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PortError::host("read_sheet", e))?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn write_raw(&self, raw: &Value) -> Result<(), PortError> {
        let text = serde_json::to_string_pretty(raw)?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| PortError::host("write_sheet", e))
    }

    /// Load, change and write back under the lock.
    async fn modify<F>(&self, change: F) -> Result<(), PortError>
    where
        F: FnOnce(&mut Value) -> Result<(), PortError> + Send,
    {
        let _guard = self.lock.lock().await;
        let mut raw = self.read_raw().await?;
        change(&mut raw)?;
        // Reject writes that would leave the file unreadable.
        serde_json::from_value::<SheetFile>(raw.clone())?;
        self.write_raw(&raw).await
    }
}

fn set_path(target: &mut Value, path: &str, value: Value) -> Result<(), PortError> {
    match path.split_once('.') {
        None => match target {
            Value::Object(map) => {
                map.insert(path.to_string(), value);
                Ok(())
            }
            _ => Err(PortError::serialization(format!(
                "Cannot set '{}' on a non-object",
                path
            ))),
        },
        Some((head, rest)) => match target {
            Value::Object(map) => {
                let child = map
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Default::default()));
                set_path(child, rest, value)
            }
            _ => Err(PortError::serialization(format!(
                "Cannot descend into '{}' on a non-object",
                head
            ))),
        },
    }
}

fn apply_updates(target: &mut Value, updates: Vec<FieldUpdate>) -> Result<(), PortError> {
    updates
        .into_iter()
        .try_for_each(|update| set_path(target, &update.path, update.value))
}

fn feature_mut<'a>(raw: &'a mut Value, id: FeatureId) -> Result<&'a mut Value, PortError> {
    let id_value = serde_json::to_value(id)?;
    raw.get_mut("features")
        .and_then(Value::as_array_mut)
        .and_then(|features| features.iter_mut().find(|f| f.get("id") == Some(&id_value)))
        .ok_or_else(|| PortError::not_found("Feature", id))
}

#[async_trait]
impl DocumentPort for JsonFileDocuments {
    async fn update_character(
        &self,
        id: CharacterId,
        updates: Vec<FieldUpdate>,
    ) -> Result<(), PortError> {
        let id_value = serde_json::to_value(id)?;
        self.modify(move |raw| {
            let character = raw
                .get_mut("character")
                .filter(|c| c.get("id") == Some(&id_value))
                .ok_or_else(|| PortError::not_found("Character", id))?;
            apply_updates(character, updates)
        })
        .await
    }

    async fn update_feature(
        &self,
        id: FeatureId,
        updates: Vec<FieldUpdate>,
    ) -> Result<(), PortError> {
        self.modify(move |raw| apply_updates(feature_mut(raw, id)?, updates))
            .await
    }

    async fn update_features(
        &self,
        updates: Vec<(FeatureId, Vec<FieldUpdate>)>,
    ) -> Result<(), PortError> {
        self.modify(move |raw| {
            updates
                .into_iter()
                .try_for_each(|(id, fields)| apply_updates(feature_mut(raw, id)?, fields))
        })
        .await
    }

    async fn delete_features(&self, ids: Vec<FeatureId>) -> Result<(), PortError> {
        let ids = ids
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.modify(move |raw| {
            if let Some(features) = raw.get_mut("features").and_then(Value::as_array_mut) {
                features.retain(|f| f.get("id").map_or(true, |id| !ids.contains(id)));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitsheet_domain::{CharacterField, FeatureField, Stat, SystemConfig};

    async fn sheet_on_disk() -> (tempfile::TempDir, JsonFileDocuments, SheetFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let character = Character::new("Ash", &SystemConfig::default()).unwrap();
        let features = vec![
            Feature::new("Bow").unwrap().owned_by(character.id),
            Feature::new("Rope").unwrap().owned_by(character.id),
        ];
        let sheet = SheetFile {
            character,
            features,
        };
        tokio::fs::write(&path, serde_json::to_string(&sheet).unwrap())
            .await
            .unwrap();
        (dir, JsonFileDocuments::new(path), sheet)
    }

    #[tokio::test]
    async fn update_character_sets_dot_paths() {
        let (_dir, store, sheet) = sheet_on_disk().await;
        let update = CharacterField::Biography("<p>Hi</p>".into())
            .to_update()
            .unwrap();
        store
            .update_character(sheet.character.id, vec![update])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.character.system.biography, "<p>Hi</p>");
    }

    #[tokio::test]
    async fn update_character_rejects_other_ids() {
        let (_dir, store, _sheet) = sheet_on_disk().await;
        let err = store
            .update_character(CharacterId::new(), vec![])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn feature_updates_and_deletes() {
        let (_dir, store, sheet) = sheet_on_disk().await;
        let bow = sheet.features[0].id;
        let rope = sheet.features[1].id;

        let stats = FeatureField::Stats(vec![Stat::value("ammo", 6.0)])
            .to_update()
            .unwrap();
        store.update_feature(bow, vec![stats]).await.unwrap();

        let category = FeatureField::Category("items".into()).to_update().unwrap();
        store
            .update_features(vec![(bow, vec![category.clone()]), (rope, vec![category])])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.features[0].system.stats.len(), 1);
        assert!(loaded.features.iter().all(|f| f.system.category == "items"));

        store.delete_features(vec![bow]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.features.len(), 1);
        assert_eq!(loaded.features[0].id, rope);
    }

    #[tokio::test]
    async fn invalid_write_leaves_file_untouched() {
        let (_dir, store, sheet) = sheet_on_disk().await;
        let bad = FieldUpdate {
            path: "system.stats".into(),
            value: serde_json::json!("not a list"),
        };
        assert!(store.update_feature(sheet.features[0].id, vec![bad]).await.is_err());
        assert_eq!(store.load().await.unwrap(), sheet);
    }
}
