//! Query descriptors and positional answer binding.

use serde::{Deserialize, Serialize};

use super::parser::{InlineTag, TagKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    /// `"Fire|fire"` splits on the first `|`; without one the label doubles
    /// as the value.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('|') {
            Some((label, value)) => Self {
                label: label.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => Self {
                label: raw.trim().to_string(),
                value: raw.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueryKind {
    #[serde(rename_all = "camelCase")]
    Input { default_value: String },
    Select { options: Vec<SelectOption> },
}

/// A captured `@input` / `@select` tag awaiting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub label: String,
    #[serde(flatten)]
    pub kind: QueryKind,
}

impl QueryDescriptor {
    pub fn input(label: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: QueryKind::Input {
                default_value: default_value.into(),
            },
        }
    }

    pub fn select(label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            label: label.into(),
            kind: QueryKind::Select { options },
        }
    }

    /// Descriptor for a query tag; `None` for `@stat`.
    pub fn from_tag(tag: &InlineTag) -> Option<Self> {
        let label = tag.target.trim();
        match tag.kind {
            TagKind::Stat => None,
            TagKind::Input => Some(Self::input(
                label,
                tag.args.first().map(|d| d.trim()).unwrap_or_default(),
            )),
            TagKind::Select => Some(Self::select(
                label,
                tag.args.iter().map(|raw| SelectOption::parse(raw)).collect(),
            )),
        }
    }

    /// Placeholder glyph shown while authoring.
    pub fn glyph(&self) -> char {
        match self.kind {
            QueryKind::Input { .. } => '>',
            QueryKind::Select { .. } => '?',
        }
    }

    /// Text an answer resolves to.
    ///
    /// An empty input answer falls back to the default; a select answer
    /// resolves to the label of the option carrying that value, or stays
    /// as typed when no option matches.
    pub fn resolve<'a>(&'a self, answer: Option<&'a str>) -> &'a str {
        let answer = answer.unwrap_or_default();
        match &self.kind {
            QueryKind::Input { default_value } => {
                if answer.trim().is_empty() {
                    default_value.as_str()
                } else {
                    answer
                }
            }
            QueryKind::Select { options } => options
                .iter()
                .find(|option| option.value == answer)
                .map(|option| option.label.as_str())
                .unwrap_or(answer),
        }
    }
}

/// The answer at `cursor` and the cursor for the next query tag.
///
/// Every query tag consumes exactly one position, answered or not.
pub fn bind_answer(answers: &[String], cursor: usize) -> (Option<&str>, usize) {
    (answers.get(cursor).map(String::as_str), cursor + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::inline_tags;

    #[test]
    fn test_descriptors_from_tags() {
        let tags = inline_tags("@input[Target]{ orc } @select[Element]{Fire|fire}{Ice}");
        let input = QueryDescriptor::from_tag(&tags[0]).unwrap();
        assert_eq!(input, QueryDescriptor::input("Target", "orc"));
        assert_eq!(input.glyph(), '>');

        let select = QueryDescriptor::from_tag(&tags[1]).unwrap();
        assert_eq!(
            select.kind,
            QueryKind::Select {
                options: vec![
                    SelectOption { label: "Fire".into(), value: "fire".into() },
                    SelectOption { label: "Ice".into(), value: "Ice".into() },
                ]
            }
        );
        assert_eq!(select.glyph(), '?');
    }

    #[test]
    fn test_stat_tags_are_not_queries() {
        let tags = inline_tags("@stat[hp]");
        assert_eq!(QueryDescriptor::from_tag(&tags[0]), None);
    }

    #[test]
    fn test_resolve_answers() {
        let input = QueryDescriptor::input("Target", "orc");
        assert_eq!(input.resolve(Some("goblin")), "goblin");
        assert_eq!(input.resolve(Some("  ")), "orc");
        assert_eq!(input.resolve(None), "orc");

        let select = QueryDescriptor::select(
            "Element",
            vec![SelectOption::parse("Fire|fire"), SelectOption::parse("Ice|ice")],
        );
        assert_eq!(select.resolve(Some("ice")), "Ice");
        assert_eq!(select.resolve(Some("acid")), "acid");
        assert_eq!(select.resolve(None), "");
    }

    #[test]
    fn test_bind_answer_advances_cursor() {
        let answers = vec!["a".to_string(), "b".to_string()];
        assert_eq!(bind_answer(&answers, 0), (Some("a"), 1));
        assert_eq!(bind_answer(&answers, 1), (Some("b"), 2));
        assert_eq!(bind_answer(&answers, 2), (None, 3));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let value = serde_json::to_value(QueryDescriptor::input("Target", "orc")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"label": "Target", "type": "input", "defaultValue": "orc"})
        );
    }
}
