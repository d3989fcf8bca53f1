//! Shared stat behaviour for characters and features.
//!
//! Both entity kinds expose their stats through [`StatContainer`]; the free
//! functions below hold the tag rules applied at write time.

use crate::common::normalize_key;
use crate::enrichment::StatContext;
use crate::value_objects::{RollData, Stat};
use crate::DomainError;

pub trait StatContainer {
    /// Stats stored on this document, in display order.
    fn owned_stats(&self) -> Vec<&Stat>;

    /// Read-only lookup table used by enrichment and rolls.
    fn stat_context(&self) -> StatContext;

    fn find_stat(&self, tag: &str) -> Option<&Stat> {
        let tag = normalize_tag(tag);
        self.owned_stats().into_iter().find(|stat| stat.tag == tag)
    }

    /// Numeric snapshot for formula references.
    fn roll_data(&self) -> RollData {
        self.stat_context().roll_data()
    }
}

pub fn normalize_tag(tag: &str) -> String {
    normalize_key(tag)
}

/// Normalize the tag and check it can be referenced from text and formulas.
pub fn validate_stat(stat: Stat) -> Result<Stat, DomainError> {
    let stat = stat.normalized();
    if stat.tag.is_empty() {
        return Err(DomainError::validation("Stat tag cannot be empty"));
    }
    if !stat.tag.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(DomainError::validation(format!(
            "Stat tag '{}' may only contain letters, digits and '_'",
            stat.tag
        )));
    }
    Ok(stat)
}

pub fn ensure_unique_tag<'a, I>(existing: I, tag: &str) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a str>,
{
    let tag = normalize_tag(tag);
    if existing.into_iter().any(|other| other == tag) {
        return Err(DomainError::validation(format!(
            "A stat tagged '{}' already exists",
            tag
        )));
    }
    Ok(())
}
