//! Field declarations handed to the host's validation layer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{Character, ColorStats, CoreStat, Feature, RollDetails};
use crate::value_objects::{StatColor, SystemConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Html,
    Color,
    Stat,
    StatList,
    ColorStats,
    Categories,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub path: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Value,
    /// Allowed keys or values, when the field is an enumeration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FieldSchema {
    fn new(path: &str, kind: FieldKind, required: bool, default: Value) -> Self {
        Self {
            path: path.to_string(),
            kind,
            required,
            default,
            choices: Vec::new(),
        }
    }

    fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered field declarations for one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSchema {
    pub document: String,
    pub fields: Vec<FieldSchema>,
}

impl DocumentSchema {
    pub fn field(&self, path: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.path == path)
    }

    /// Default document body built from the declared defaults.
    pub fn defaults(&self) -> Value {
        let mut root = json!({});
        for field in &self.fields {
            insert_path(&mut root, &field.path, field.default.clone());
        }
        root
    }
}

fn insert_path(root: &mut Value, path: &str, value: Value) {
    let Value::Object(map) = root else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map.entry(head.to_string()).or_insert_with(|| json!({}));
            insert_path(child, rest, value);
        }
    }
}

impl Character {
    pub fn schema(config: &SystemConfig) -> DocumentSchema {
        let core = CoreStat::ALL.into_iter().map(|core| {
            FieldSchema::new(
                &format!("system.{}", core),
                FieldKind::Stat,
                true,
                json!(core.default_stat()),
            )
        });
        let categories: Vec<Value> = config
            .default_categories
            .iter()
            .map(|name| json!({ "name": name, "color": null, "collapsed": false, "trackers": [] }))
            .collect();

        let mut fields = vec![FieldSchema::new("name", FieldKind::String, true, json!(""))];
        fields.extend(core);
        fields.extend([
            FieldSchema::new(
                "system.colorStats",
                FieldKind::ColorStats,
                true,
                json!(ColorStats::default()),
            )
            .with_choices(StatColor::ALL.iter().map(StatColor::as_str)),
            FieldSchema::new("system.categories", FieldKind::Categories, true, json!(categories)),
            FieldSchema::new("system.biography", FieldKind::Html, false, json!("")),
            FieldSchema::new("system.class", FieldKind::String, false, json!("")),
            FieldSchema::new("system.word", FieldKind::String, false, json!("")),
            FieldSchema::new("system.type", FieldKind::String, false, json!("")),
            FieldSchema::new(
                "system.color",
                FieldKind::Color,
                true,
                json!(config.default_color.to_string()),
            ),
        ]);

        DocumentSchema {
            document: "character".to_string(),
            fields,
        }
    }
}

impl Feature {
    pub fn schema() -> DocumentSchema {
        DocumentSchema {
            document: "feature".to_string(),
            fields: vec![
                FieldSchema::new("name", FieldKind::String, true, json!("")),
                FieldSchema::new("system.color", FieldKind::Color, false, Value::Null),
                FieldSchema::new("system.category", FieldKind::String, false, json!("")),
                FieldSchema::new("system.stats", FieldKind::StatList, true, json!([])),
                FieldSchema::new("system.description", FieldKind::Html, false, json!("")),
                FieldSchema::new(
                    "system.details",
                    FieldKind::Object,
                    true,
                    json!(RollDetails::default()),
                ),
            ],
        }
    }
}
