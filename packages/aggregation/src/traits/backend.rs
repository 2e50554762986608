//! Backend trait for the external language-understanding service.
//!
//! The AI-assisted extractor hands free text to an implementation of this
//! trait. Authentication, quotas and prompting are the backend's business;
//! the library only sees entities or an error.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;

/// One entity as reported by a backend, before validation.
///
/// `field` is a free string (`"name"`, `"age"`, ...); values the library
/// cannot map to a profile field are dropped by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BackendEntity {
    pub field: String,
    pub value: String,

    /// Backend confidence, 0.0 to 1.0
    pub strength: f64,
}

impl BackendEntity {
    pub fn new(field: impl Into<String>, value: impl Into<String>, strength: f64) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            strength,
        }
    }
}

/// Entity-extraction backend.
///
/// Implementations wrap specific providers (OpenAI-compatible APIs, local
/// models, ...) and handle the specifics of prompting and response parsing.
#[async_trait]
pub trait EntityBackend: Send + Sync {
    /// Extract {name, age, location, occupation} style fields from text.
    async fn extract_entities(&self, text: &str) -> BackendResult<Vec<BackendEntity>>;

    /// Backend name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
