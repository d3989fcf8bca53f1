//! Kitsheet domain: character and feature models, palettes, dice formulas
//! and the inline-tag enrichment engine.
//!
//! Everything here is synchronous and free of I/O. The engine crate wires
//! these types to the host through ports.

extern crate self as kitsheet_domain;

pub mod common;
pub mod enrichment;
pub mod entities;
pub mod error;
pub mod ids;
pub mod schema;
pub mod stat_container;
pub mod updates;
pub mod value_objects;

pub use entities::{
    Category, Character, CharacterData, ClassLevel, ColorStats, CoreStat, Feature, FeatureData,
    OwnedFeature, RollDetails, Usage, ACTOR_PREFIX,
};

pub use enrichment::{
    bind_answer, Enriched, Enricher, QueryDescriptor, QueryKind, SelectOption, StatContext,
    StatKind,
};

pub use error::DomainError;

pub use ids::{CharacterId, FeatureId};

pub use schema::{DocumentSchema, FieldKind, FieldSchema};

pub use stat_container::{ensure_unique_tag, normalize_tag, validate_stat, StatContainer};

pub use updates::{CategoryDeletion, CategoryRename, CharacterField, FeatureField, FieldUpdate};

pub use value_objects::{
    classify_crit, derive_palette, label_keys, luma, Contrast, CritKind, DiceExpression,
    FormulaError, FormulaEvaluation, HexColor, Palette, RollData, RollMode, RollPlan, Stat,
    StatColor, StatView, SystemConfig, TrackedStat, Tracker, FALLBACK_FORMULA,
};
