//! Configuration types for orchestration and extraction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which entity-extraction strategy runs on free-text payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// AI backend, falling back to patterns on error
    Ai,

    /// Deterministic pattern rules only
    #[default]
    Pattern,
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai" | "llm" => Ok(ExtractorKind::Ai),
            "pattern" | "regex" => Ok(ExtractorKind::Pattern),
            other => Err(format!("unknown extractor kind: {}", other)),
        }
    }
}

/// Configuration for an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline shared by every adapter task of a run.
    ///
    /// Adapters still pending when it elapses are cancelled and reported as
    /// unreachable with a timeout. Default: 15s.
    #[serde(with = "duration_ms")]
    pub run_deadline: Duration,

    /// Extraction strategy for free-text payloads. Default: Pattern.
    pub extractor: ExtractorKind,

    /// Strength given to pattern-extracted entities (cap). Default: 0.5.
    pub pattern_strength: f32,

    /// Longest text sent to the AI backend, in bytes. Default: 12000.
    pub max_text_len: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            run_deadline: Duration::from_secs(15),
            extractor: ExtractorKind::Pattern,
            pattern_strength: 0.5,
            max_text_len: 12_000,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the run deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Set the extraction strategy.
    pub fn with_extractor(mut self, extractor: ExtractorKind) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the pattern strength cap (clamped to [0, 1]).
    pub fn with_pattern_strength(mut self, strength: f32) -> Self {
        self.pattern_strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum text length sent to the AI backend.
    pub fn with_max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
