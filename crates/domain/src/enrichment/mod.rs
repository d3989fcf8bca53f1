//! Enrichment engine
//!
//! Turns authored rich text containing inline tags into rendered HTML. Two
//! modes, one per call:
//!
//! - **static** ([`Enricher::enrich`]): `@stat` tags render live values,
//!   query tags render an authoring placeholder and, for features, are
//!   captured as [`QueryDescriptor`]s.
//! - **chat** ([`Enricher::enrich_chat`]): `@stat` tags render the same way,
//!   query tags render the answer at the current cursor position. Answers
//!   bind strictly by position, so reordering tags in the text changes
//!   which answer lands where.
//!
//! An unknown `@stat` tag never fails: it renders as an invalid marker
//! carrying the original text.

mod parser;
mod query;
mod stat_context;

pub use parser::{inline_tags, parse_inline_tags, InlineTag, Segment, TagKind};
pub use query::{bind_answer, QueryDescriptor, QueryKind, SelectOption};
pub use stat_context::{ContextStat, StatContext, StatKind};

use serde::{Deserialize, Serialize};

use crate::common::{escape_html, normalize_key};
use crate::entities::{Character, Feature};
use crate::stat_container::StatContainer;
use crate::value_objects::{label_keys, SystemConfig};

/// Output of one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enriched {
    pub html: String,
    /// Query descriptors in text order (features only)
    pub queries: Vec<QueryDescriptor>,
    /// Raw text of every `@stat` tag that did not resolve
    pub invalid_tags: Vec<String>,
}

/// Enriches text against one document's stat context.
#[derive(Debug, Clone)]
pub struct Enricher<'a> {
    context: StatContext,
    collect_queries: bool,
    config: &'a SystemConfig,
}

impl<'a> Enricher<'a> {
    pub fn new(context: StatContext, collect_queries: bool, config: &'a SystemConfig) -> Self {
        Self {
            context,
            collect_queries,
            config,
        }
    }

    pub fn for_character(character: &Character, config: &'a SystemConfig) -> Self {
        Self::new(character.stat_context(), false, config)
    }

    /// Owned features also see the owner's stats under `actor.`.
    pub fn for_feature(
        feature: &Feature,
        owner: Option<&Character>,
        config: &'a SystemConfig,
    ) -> Self {
        let context = match owner {
            Some(owner) => feature.with_owner(owner).stat_context(),
            None => feature.stat_context(),
        };
        Self::new(context, true, config)
    }

    pub fn context(&self) -> &StatContext {
        &self.context
    }

    /// Static mode.
    pub fn enrich(&self, text: &str) -> Enriched {
        parse_inline_tags(text)
            .into_iter()
            .fold(Enriched::default(), |mut out, segment| {
                match segment {
                    Segment::Text(text) => out.html.push_str(&text),
                    Segment::Tag(tag) => match QueryDescriptor::from_tag(&tag) {
                        None => self.push_stat(&mut out, &tag),
                        Some(query) => {
                            out.html.push_str(&placeholder_html(&query));
                            if self.collect_queries {
                                out.queries.push(query);
                            }
                        }
                    },
                }
                out
            })
    }

    /// Chat mode: query tags consume `answers` left to right.
    pub fn enrich_chat(&self, text: &str, answers: &[String]) -> Enriched {
        let (out, _cursor) = parse_inline_tags(text).into_iter().fold(
            (Enriched::default(), 0usize),
            |(mut out, cursor), segment| {
                let cursor = match segment {
                    Segment::Text(text) => {
                        out.html.push_str(&text);
                        cursor
                    }
                    Segment::Tag(tag) => match QueryDescriptor::from_tag(&tag) {
                        None => {
                            self.push_stat(&mut out, &tag);
                            cursor
                        }
                        Some(query) => {
                            let (answer, next) = bind_answer(answers, cursor);
                            out.html.push_str(&answer_html(query.resolve(answer)));
                            if self.collect_queries {
                                out.queries.push(query);
                            }
                            next
                        }
                    },
                };
                (out, cursor)
            },
        );
        out
    }

    fn push_stat(&self, out: &mut Enriched, tag: &InlineTag) {
        let key = normalize_key(&tag.target);
        match self.context.get(&key) {
            Some(entry) => {
                let tooltip = tag
                    .args
                    .first()
                    .map(|tip| format!(" data-tooltip=\"{}\"", escape_html(tip.trim())))
                    .unwrap_or_default();
                out.html.push_str(&format!(
                    "<span class=\"{}\" data-stat=\"{}\"{}>{}</span>",
                    entry.kind.css_classes(),
                    escape_html(&key),
                    tooltip,
                    escape_html(&entry.stat.display_text()),
                ));
            }
            None => {
                let message = self
                    .config
                    .format(label_keys::UNKNOWN_STAT, &[("tag", tag.target.trim())]);
                out.html.push_str(&format!(
                    "<span class=\"kit-stat invalid\" data-tooltip=\"{}\">{}</span>",
                    escape_html(&message),
                    escape_html(&tag.raw),
                ));
                out.invalid_tags.push(tag.raw.clone());
            }
        }
    }
}

fn placeholder_html(query: &QueryDescriptor) -> String {
    let kind = match query.kind {
        QueryKind::Input { .. } => "input",
        QueryKind::Select { .. } => "select",
    };
    format!(
        "<span class=\"kit-query kit-query-{}\"><i class=\"kit-query-glyph\">{}</i> {}</span>",
        kind,
        escape_html(&query.glyph().to_string()),
        escape_html(&query.label),
    )
}

fn answer_html(answer: &str) -> String {
    format!("<span class=\"kit-answer\">{}</span>", escape_html(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{Stat, StatColor};

    fn config() -> SystemConfig {
        SystemConfig::default()
    }

    fn character() -> Character {
        let mut character = Character::new("Ash", &config()).unwrap();
        character.system.stamina = Stat::resource("stamina", 15.0, 15.0);
        let field = character
            .add_color_stat(Stat::label("mood", "Grim"), Some(StatColor::Purple))
            .unwrap();
        character.apply(field);
        character
    }

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_static_core_stat_renders_resource() {
        let config = config();
        let character = character();
        let out = Enricher::for_character(&character, &config).enrich("HP: @stat[stamina]");
        assert_eq!(
            out.html,
            "HP: <span class=\"kit-stat kit-stat-core\" data-stat=\"stamina\">15 / 15</span>"
        );
        assert!(out.invalid_tags.is_empty());
    }

    #[test]
    fn test_static_color_stat_by_tag_and_slot_alias() {
        let config = config();
        let character = character();
        let enricher = Enricher::for_character(&character, &config);
        let by_tag = enricher.enrich("@stat[MOOD]").html;
        assert_eq!(
            by_tag,
            "<span class=\"kit-stat kit-stat-color kit-stat-purple\" data-stat=\"mood\">Grim</span>"
        );
        let by_slot = enricher.enrich("@stat[stat.purple]{Feeling}").html;
        assert!(by_slot.contains("data-tooltip=\"Feeling\""));
        assert!(by_slot.contains(">Grim</span>"));
    }

    #[test]
    fn test_unknown_stat_degrades_to_invalid_marker() {
        let config = config();
        let character = character();
        let out = Enricher::for_character(&character, &config).enrich("x @stat[<foo>] y");
        assert_eq!(
            out.html,
            "x <span class=\"kit-stat invalid\" data-tooltip=\"Unknown stat: &lt;foo&gt;\">@stat[&lt;foo&gt;]</span> y"
        );
        assert_eq!(out.invalid_tags, vec!["@stat[<foo>]"]);
    }

    #[test]
    fn test_static_feature_collects_queries() {
        let config = config();
        let owner = character();
        let feature = Feature::new("Blast")
            .unwrap()
            .owned_by(owner.id)
            .with_stat(Stat::value("range", 30.0));
        let text = "@input[Target]{orc} takes @stat[actor.stamina] at @stat[range] with @select[Element]{Fire|fire}";

        let out = Enricher::for_feature(&feature, Some(&owner), &config).enrich(text);
        assert_eq!(out.queries.len(), 2);
        assert_eq!(out.queries[0], QueryDescriptor::input("Target", "orc"));
        assert!(out.html.starts_with(
            "<span class=\"kit-query kit-query-input\"><i class=\"kit-query-glyph\">&gt;</i> Target</span>"
        ));
        assert!(out.html.contains("<i class=\"kit-query-glyph\">?</i> Element</span>"));
        assert!(out.html.contains("data-stat=\"actor.stamina\">15 / 15<"));
        assert!(out.html.contains("kit-stat kit-stat-feature"));
    }

    #[test]
    fn test_character_text_does_not_collect_queries() {
        let config = config();
        let character = character();
        let out = Enricher::for_character(&character, &config).enrich("@input[Why]");
        assert!(out.queries.is_empty());
        assert!(out.html.contains("kit-query-input"));
    }

    #[test]
    fn test_chat_binds_select_answers_by_position() {
        let config = config();
        let feature = Feature::new("Blast").unwrap();
        let text = "@select[First]{Fire|fire}{Ice|ice} then @select[Second]{Fire|fire}{Ice|ice}";
        let enricher = Enricher::for_feature(&feature, None, &config);

        let out = enricher.enrich_chat(text, &answers(&["ice", "fire"]));
        assert_eq!(
            out.html,
            "<span class=\"kit-answer\">Ice</span> then <span class=\"kit-answer\">Fire</span>"
        );

        let swapped = enricher.enrich_chat(text, &answers(&["fire", "ice"]));
        assert_eq!(
            swapped.html,
            "<span class=\"kit-answer\">Fire</span> then <span class=\"kit-answer\">Ice</span>"
        );
    }

    #[test]
    fn test_chat_input_defaults_and_missing_answers() {
        let config = config();
        let feature = Feature::new("Blast").unwrap();
        let enricher = Enricher::for_feature(&feature, None, &config);
        let text = "@input[A]{one} @input[B]{two} @input[C]";

        let out = enricher.enrich_chat(text, &answers(&["", "<b>"]));
        assert_eq!(
            out.html,
            "<span class=\"kit-answer\">one</span> <span class=\"kit-answer\">&lt;b&gt;</span> <span class=\"kit-answer\"></span>"
        );
        assert_eq!(out.queries.len(), 3);
    }

    #[test]
    fn test_chat_stat_tags_do_not_consume_answers() {
        let config = config();
        let feature = Feature::new("Blast").unwrap().with_stat(Stat::value("dmg", 4.0));
        let enricher = Enricher::for_feature(&feature, None, &config);
        let out = enricher.enrich_chat("@stat[dmg] @input[X] @stat[nope]", &answers(&["hit"]));
        assert!(out.html.contains(">4</span> <span class=\"kit-answer\">hit</span>"));
        assert_eq!(out.invalid_tags, vec!["@stat[nope]"]);
    }
}
