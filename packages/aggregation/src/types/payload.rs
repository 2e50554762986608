//! Source payloads: what one adapter answered for one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::types::profile::{FieldValue, ProfileField};

/// A normalized partial record from a structured source.
///
/// Adapters translate their wire format into this shape; a record may carry
/// any subset of fields, and list fields may repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// The adapter's self-reported reliability for this record (0.0-1.0).
    pub strength: f32,

    /// Field/value pairs in the order the source gave them.
    pub entries: Vec<RecordEntry>,
}

/// One field/value pair of a [`SourceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub field: ProfileField,
    pub value: FieldValue,
}

impl SourceRecord {
    /// Create an empty record with the given strength, clamped to [0, 1].
    pub fn new(strength: f32) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            entries: Vec::new(),
        }
    }

    /// Add a parsed value; unparseable or blank input is dropped.
    pub fn with(mut self, field: ProfileField, raw: &str) -> Self {
        self.push(field, raw);
        self
    }

    /// Add a parsed value in place. Returns whether it was kept.
    pub fn push(&mut self, field: ProfileField, raw: &str) -> bool {
        match FieldValue::parse_for(field, raw) {
            Some(value) => {
                self.entries.push(RecordEntry { field, value });
                true
            }
            None => false,
        }
    }

    /// Add an already-built value.
    pub fn with_value(mut self, field: ProfileField, value: FieldValue) -> Self {
        self.entries.push(RecordEntry { field, value });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values recorded for one field.
    pub fn values(&self, field: ProfileField) -> impl Iterator<Item = &FieldValue> {
        self.entries
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| &e.value)
    }
}

/// The data half of a successful answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PayloadData {
    /// Structured, already-normalized fields
    Record(SourceRecord),

    /// Free text that still needs entity extraction
    Text(String),

    /// Source was reached and found nothing
    Empty,
}

impl PayloadData {
    /// Free text to hand to the entity extractor, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            PayloadData::Text(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Why an adapter invocation produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Network failure; `timeout` is set when a deadline cancelled the call
    Unreachable { timeout: bool },

    /// Source refused or rate-limited the request
    Blocked,

    /// Source answered but parsing failed
    MalformedResponse,

    /// Adapter was called without the query fields it needs
    InvalidInput,
}

impl FailureKind {
    /// Whether a later run may retry this source.
    ///
    /// Malformed answers are retried like network failures; blocked sources
    /// wait for backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Unreachable { .. } | FailureKind::MalformedResponse
        )
    }
}

/// One adapter's raw answer for one run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourcePayload {
    Success {
        data: PayloadData,
        fetched_at: DateTime<Utc>,
    },
    Failure {
        #[serde(flatten)]
        kind: FailureKind,
        message: String,
    },
}

impl SourcePayload {
    /// A successful answer fetched now.
    pub fn success(data: PayloadData) -> Self {
        Self::Success {
            data,
            fetched_at: Utc::now(),
        }
    }

    /// Translate an adapter result. `NoMatch` is a success with no data.
    pub fn from_result(result: Result<PayloadData, AdapterError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => {
                let kind = match &e {
                    AdapterError::NoMatch => return Self::success(PayloadData::Empty),
                    AdapterError::Unreachable { timeout, .. } => {
                        FailureKind::Unreachable { timeout: *timeout }
                    }
                    AdapterError::Blocked(_) => FailureKind::Blocked,
                    AdapterError::Malformed(_) => FailureKind::MalformedResponse,
                    AdapterError::MissingInput { .. } => FailureKind::InvalidInput,
                };
                Self::Failure {
                    kind,
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourcePayload::Success { .. })
    }

    pub fn data(&self) -> Option<&PayloadData> {
        match self {
            SourcePayload::Success { data, .. } => Some(data),
            SourcePayload::Failure { .. } => None,
        }
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SourcePayload::Success { fetched_at, .. } => Some(*fetched_at),
            SourcePayload::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SourcePayload::Failure { kind, .. } => Some(*kind),
            SourcePayload::Success { .. } => None,
        }
    }
}
