//! Entities extracted from free text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::profile::{FieldValue, ProfileField};

/// A candidate structured field pulled out of a free-text payload.
///
/// Ephemeral: produced by an extractor, consumed once by the correlator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub field: ProfileField,
    pub value: FieldValue,

    /// The extractor's self-reported reliability (0.0-1.0).
    pub strength: f32,
}

impl ExtractedEntity {
    /// Create an entity; strength is clamped to [0, 1].
    pub fn new(field: ProfileField, value: FieldValue, strength: f32) -> Self {
        Self {
            field,
            value,
            strength: strength.clamp(0.0, 1.0),
        }
    }

    /// Parse raw text into a value for `field`, dropping unusable input.
    pub fn parse(field: ProfileField, raw: &str, strength: f32) -> Option<Self> {
        FieldValue::parse_for(field, raw).map(|value| Self::new(field, value, strength))
    }
}

/// Which extraction path produced a set of entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// AI backend answered
    Ai,

    /// Pattern rules were the configured strategy
    Pattern,

    /// AI backend failed and pattern rules were used instead
    PatternFallback { reason: String },
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Ai => f.write_str("ai"),
            ExtractionMethod::Pattern => f.write_str("pattern"),
            ExtractionMethod::PatternFallback { .. } => f.write_str("pattern_fallback"),
        }
    }
}

/// Entities plus the path that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub entities: Vec<ExtractedEntity>,
    pub method: ExtractionMethod,
}

impl Extraction {
    pub fn new(entities: Vec<ExtractedEntity>, method: ExtractionMethod) -> Self {
        Self { entities, method }
    }

    /// Entities for one field.
    pub fn for_field(&self, field: ProfileField) -> impl Iterator<Item = &ExtractedEntity> {
        self.entities.iter().filter(move |e| e.field == field)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.method, ExtractionMethod::PatternFallback { .. })
    }
}
