//! Pure list-mutation helpers shared by every entity collection.
//!
//! Records are addressed by a [`Selector`]: either a position or a
//! partial-match [`Query`]. Matching is always "first match wins" in
//! insertion order, and every mutator returns a new `Vec` instead of
//! touching its input, because the host diffs whole replacement values.
//!
//! # Empty queries
//!
//! A query with no keys matches **every** record, so it selects the first
//! element of any non-empty sequence. This is easy to trigger by accident
//! when a query field is built from an absent value; use
//! [`Query::field_opt`] with care and check [`Query::is_empty`] when the
//! query comes from user input.
//!
//! # Example
//!
//! ```
//! use kitsheet_domain::common::sequence::{self, Query, Selector};
//! use kitsheet_domain::Stat;
//!
//! let stats = vec![Stat::value("hp", 3.0), Stat::value("ap", 1.0)];
//! let query: Selector = Query::new().field("tag", "ap").into();
//!
//! assert_eq!(sequence::index_of(&stats, &query), Some(1));
//! let trimmed = sequence::remove(&stats, &query);
//! assert_eq!(trimmed.len(), 1);
//! assert_eq!(stats.len(), 2); // input untouched
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::DomainError;

/// A partial record: every present key must equal the record's field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Map<String, Value>);

impl Query {
    /// An empty query. Matches everything until a field is added.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Adds the field only when `value` is present.
    pub fn field_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `record` carries every key of this query with an equal value.
    pub fn matches<T: Serialize>(&self, record: &T) -> bool {
        if self.0.is_empty() {
            return true;
        }
        match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => self
                .0
                .iter()
                .all(|(key, expected)| fields.get(key).is_some_and(|v| loose_eq(v, expected))),
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for Query {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Addresses one record in a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Index(usize),
    Query(Query),
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Query> for Selector {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

/// Position of the first record matching `selector`, or `None` on a miss.
pub fn index_of<T: Serialize>(seq: &[T], selector: &Selector) -> Option<usize> {
    match selector {
        Selector::Index(index) => (*index < seq.len()).then_some(*index),
        Selector::Query(query) => seq.iter().position(|record| query.matches(record)),
    }
}

pub fn has<T: Serialize>(seq: &[T], selector: &Selector) -> bool {
    index_of(seq, selector).is_some()
}

/// A detached copy of the first matching record.
pub fn get<T: Serialize + Clone>(seq: &[T], selector: &Selector) -> Option<T> {
    index_of(seq, selector).map(|index| seq[index].clone())
}

/// Inserts `record` at `index` (clamped to the length) or appends it.
pub fn add<T: Clone>(seq: &[T], record: T, index: Option<usize>) -> Vec<T> {
    let mut out = seq.to_vec();
    match index {
        Some(index) => out.insert(index.min(out.len()), record),
        None => out.push(record),
    }
    out
}

/// Removes the first matching record. A miss returns an unchanged copy.
pub fn remove<T: Serialize + Clone>(seq: &[T], selector: &Selector) -> Vec<T> {
    let mut out = seq.to_vec();
    if let Some(index) = index_of(seq, selector) {
        out.remove(index);
    }
    out
}

/// Deep-merges `changes` onto the first matching record.
///
/// A miss returns an unchanged copy. Fails only when the merged value no
/// longer deserializes into `T`.
pub fn set<T>(seq: &[T], selector: &Selector, changes: &Value) -> Result<Vec<T>, DomainError>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let mut out = seq.to_vec();
    if let Some(index) = index_of(seq, selector) {
        out[index] = merge_record(&seq[index], changes)?;
    }
    Ok(out)
}

/// Applies a deep-merge patch to a single record.
pub fn merge_record<T>(record: &T, changes: &Value) -> Result<T, DomainError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(record)?;
    deep_merge(&mut value, changes);
    Ok(serde_json::from_value(value)?)
}

/// Recursively merges `patch` into `target`. Objects merge key by key;
/// every other value (arrays included) replaces the target wholesale.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// JSON equality that treats `15` and `15.0` as the same number.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| loose_eq(value, other)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        rank: u32,
        #[serde(default)]
        extra: Option<Inner>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        a: u32,
        b: u32,
    }

    fn row(name: &str, rank: u32) -> Row {
        Row {
            name: name.to_string(),
            rank,
            extra: None,
        }
    }

    fn rows() -> Vec<Row> {
        vec![row("alpha", 1), row("beta", 2), row("gamma", 2)]
    }

    fn by_name(name: &str) -> Selector {
        Query::new().field("name", name).into()
    }

    #[test]
    fn query_matches_first_record_only() {
        let seq = rows();
        let rank_two: Selector = Query::new().field("rank", 2).into();
        assert_eq!(index_of(&seq, &rank_two), Some(1));
        assert_eq!(get(&seq, &rank_two), Some(row("beta", 2)));
    }

    #[test]
    fn empty_query_matches_everything() {
        let seq = rows();
        let everything: Selector = Query::new().into();
        assert_eq!(index_of(&seq, &everything), Some(0));

        let absent: Option<&str> = None;
        let accidental = Query::new().field_opt("name", absent);
        assert!(accidental.is_empty());
        assert!(has(&seq, &accidental.into()));
    }

    #[test]
    fn index_selector_out_of_range_is_a_miss() {
        let seq = rows();
        assert_eq!(index_of(&seq, &Selector::Index(3)), None);
        assert_eq!(get(&seq, &Selector::Index(7)), None);
    }

    #[test]
    fn misses_are_no_ops() {
        let seq = rows();
        let missing = by_name("delta");
        assert_eq!(remove(&seq, &missing), seq);
        assert_eq!(set(&seq, &missing, &json!({"rank": 9})).unwrap(), seq);
        assert_eq!(get(&seq, &missing), None);
        assert!(!has(&seq, &missing));
    }

    #[test]
    fn add_then_remove_round_trips() {
        let seq = rows();
        let grown = add(&seq, row("delta", 4), Some(1));
        assert_eq!(grown[1], row("delta", 4));
        assert_eq!(remove(&grown, &Selector::Index(1)), seq);

        let appended = add(&seq, row("omega", 9), None);
        assert_eq!(remove(&appended, &Selector::Index(seq.len())), seq);
    }

    #[test]
    fn add_clamps_index_past_end() {
        let seq = rows();
        let grown = add(&seq, row("late", 0), Some(99));
        assert_eq!(grown.last(), Some(&row("late", 0)));
    }

    #[test]
    fn set_deep_merges_nested_objects() {
        let mut seq = rows();
        seq[0].extra = Some(Inner { a: 1, b: 2 });

        let updated = set(&seq, &by_name("alpha"), &json!({"extra": {"b": 5}})).unwrap();
        assert_eq!(updated[0].extra, Some(Inner { a: 1, b: 5 }));
        assert_eq!(seq[0].extra, Some(Inner { a: 1, b: 2 }));
        assert_eq!(updated[1..], seq[1..]);
    }

    #[test]
    fn set_rejects_patch_that_breaks_the_shape() {
        let seq = rows();
        let result = set(&seq, &Selector::Index(0), &json!({"rank": "high"}));
        assert!(matches!(result, Err(DomainError::Parse(_))));
    }

    #[test]
    fn numbers_compare_loosely() {
        assert!(loose_eq(&json!(15), &json!(15.0)));
        assert!(!loose_eq(&json!(15), &json!(16)));
        assert!(loose_eq(&json!({"a": [1, 2]}), &json!({"a": [1.0, 2.0]})));
    }
}
