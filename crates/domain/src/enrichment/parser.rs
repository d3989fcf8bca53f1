//! Inline tag scanner
//!
//! Recognizes three tag grammars in rich text, left to right and without
//! overlap. Tag names are case-insensitive:
//!
//! - `@stat[tag]` with at most one `{tooltip}` group
//! - `@input[label]` with at most one `{default}` group
//! - `@select[label]` followed by any number of `{label|value}` groups
//!
//! Anything that does not complete a tag (unknown name, missing `]`) stays
//! in the surrounding text.
//!
//! # Example
//!
//! ```
//! use kitsheet_domain::enrichment::{parse_inline_tags, Segment, TagKind};
//!
//! let segments = parse_inline_tags("Deals @STAT[might] damage");
//! assert_eq!(segments.len(), 3);
//! match &segments[1] {
//!     Segment::Tag(tag) => {
//!         assert_eq!(tag.kind, TagKind::Stat);
//!         assert_eq!(tag.target, "might");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Stat,
    Input,
    Select,
}

impl TagKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "stat" => Some(Self::Stat),
            "input" => Some(Self::Input),
            "select" => Some(Self::Select),
            _ => None,
        }
    }

    /// Maximum `{...}` groups the tag consumes; `None` is unbounded.
    fn max_args(&self) -> Option<usize> {
        match self {
            Self::Stat | Self::Input => Some(1),
            Self::Select => None,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Input | Self::Select)
    }
}

/// One recognised tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineTag {
    pub kind: TagKind,
    /// Text between the brackets
    pub target: String,
    /// Contents of each trailing `{...}` group
    pub args: Vec<String>,
    /// The tag exactly as written
    pub raw: String,
    /// Byte offset of the `@`
    pub start: usize,
    /// Byte offset just past the tag
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Tag(InlineTag),
}

/// Split `text` into plain runs and tags.
pub fn parse_inline_tags(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('@') {
        let at = cursor + offset;
        match parse_tag_at(text, at) {
            Some(tag) => {
                if at > text_start {
                    segments.push(Segment::Text(text[text_start..at].to_string()));
                }
                cursor = tag.end;
                text_start = tag.end;
                segments.push(Segment::Tag(tag));
            }
            None => cursor = at + 1,
        }
    }

    if text_start < text.len() {
        segments.push(Segment::Text(text[text_start..].to_string()));
    }
    segments
}

/// Only the tags, in order.
pub fn inline_tags(text: &str) -> Vec<InlineTag> {
    parse_inline_tags(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Tag(tag) => Some(tag),
            Segment::Text(_) => None,
        })
        .collect()
}

// Delimiters are ASCII, so every offset below is a char boundary.
fn parse_tag_at(text: &str, at: usize) -> Option<InlineTag> {
    let name_start = at + 1;
    let open = name_start + text[name_start..].find('[')?;
    let kind = TagKind::from_name(&text[name_start..open])?;

    let body_start = open + 1;
    let close = body_start + text[body_start..].find(']')?;
    let target = &text[body_start..close];
    if target.contains('\n') {
        return None;
    }

    let mut end = close + 1;
    let mut args = Vec::new();
    while kind.max_args().map_or(true, |max| args.len() < max) && text[end..].starts_with('{') {
        let Some(len) = text[end + 1..].find('}') else {
            break;
        };
        args.push(text[end + 1..end + 1 + len].to_string());
        end += len + 2;
    }

    Some(InlineTag {
        kind,
        target: target.to_string(),
        args,
        raw: text[at..end].to_string(),
        start: at,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(segment: &Segment) -> &InlineTag {
        match segment {
            Segment::Tag(tag) => tag,
            Segment::Text(text) => panic!("expected tag, got text {text:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_one_segment() {
        assert_eq!(
            parse_inline_tags("no tags here"),
            vec![Segment::Text("no tags here".to_string())]
        );
        assert!(parse_inline_tags("").is_empty());
    }

    #[test]
    fn test_stat_with_tooltip() {
        let segments = parse_inline_tags("@stat[stamina]{Your health} left");
        let stat = tag(&segments[0]);
        assert_eq!(stat.kind, TagKind::Stat);
        assert_eq!(stat.args, vec!["Your health"]);
        assert_eq!(stat.raw, "@stat[stamina]{Your health}");
        assert_eq!(segments[1], Segment::Text(" left".to_string()));
    }

    #[test]
    fn test_stat_consumes_at_most_one_group() {
        let segments = parse_inline_tags("@stat[hp]{a}{b}");
        assert_eq!(tag(&segments[0]).args, vec!["a"]);
        assert_eq!(segments[1], Segment::Text("{b}".to_string()));
    }

    #[test]
    fn test_select_consumes_every_group() {
        let tags = inline_tags("@Select[Element]{Fire|fire}{Ice|ice}{Bolt|bolt}.");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, TagKind::Select);
        assert_eq!(tags[0].target, "Element");
        assert_eq!(tags[0].args.len(), 3);
    }

    #[test]
    fn test_offsets_and_order() {
        let text = "A @input[Target]{orc} then @stat[might]";
        let tags = inline_tags(text);
        assert_eq!(tags.len(), 2);
        assert_eq!(&text[tags[0].start..tags[0].end], "@input[Target]{orc}");
        assert_eq!(tags[1].kind, TagKind::Stat);
        assert!(tags[0].end <= tags[1].start);
    }

    #[test]
    fn test_incomplete_tags_stay_text() {
        for text in ["mail me @ home", "@stat[unclosed", "@unknown[x]", "@stat [x]"] {
            assert!(inline_tags(text).is_empty(), "{text}");
        }
        let segments = parse_inline_tags("@stat[a]{open");
        assert_eq!(tag(&segments[0]).args, Vec::<String>::new());
        assert_eq!(segments[1], Segment::Text("{open".to_string()));
    }

    #[test]
    fn test_multibyte_text_around_tags() {
        let segments = parse_inline_tags("Épée @stat[élan] ✓");
        assert_eq!(segments.len(), 3);
        assert_eq!(tag(&segments[1]).target, "élan");
        assert_eq!(segments[2], Segment::Text(" ✓".to_string()));
    }
}
