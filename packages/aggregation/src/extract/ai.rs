//! AI-assisted extraction with pattern fallback.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::extract::pattern::PatternExtractor;
use crate::traits::backend::EntityBackend;
use crate::traits::extractor::EntityExtractor;
use crate::types::entity::{ExtractedEntity, Extraction, ExtractionMethod};
use crate::types::profile::ProfileField;

/// Sends text to an [`EntityBackend`] and validates what comes back.
///
/// Any backend failure (unreachable, error status, unusable answer) degrades
/// to the pattern rules; the result is then tagged
/// [`ExtractionMethod::PatternFallback`] with the reason.
pub struct AiExtractor {
    backend: Arc<dyn EntityBackend>,
    fallback: PatternExtractor,
    max_text_len: usize,
}

impl AiExtractor {
    pub fn new(backend: Arc<dyn EntityBackend>, fallback: PatternExtractor) -> Self {
        Self {
            backend,
            fallback,
            max_text_len: 12_000,
        }
    }

    /// Limit the text sent to the backend (in bytes, cut on a char boundary).
    pub fn with_max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }

    async fn ask_backend(&self, text: &str) -> BackendResult<Vec<ExtractedEntity>> {
        let raw = self
            .backend
            .extract_entities(truncate(text, self.max_text_len))
            .await?;

        let total = raw.len();
        let entities: Vec<ExtractedEntity> = raw
            .into_iter()
            .filter_map(|e| {
                let field = ProfileField::parse(&e.field)?;
                ExtractedEntity::parse(field, &e.value, e.strength as f32)
            })
            .collect();

        if total > 0 && entities.is_empty() {
            return Err(BackendError::Malformed(format!(
                "none of {} entities were usable",
                total
            )));
        }
        if entities.len() < total {
            debug!(
                dropped = total - entities.len(),
                "Dropped unusable backend entities"
            );
        }
        Ok(entities)
    }
}

#[async_trait]
impl EntityExtractor for AiExtractor {
    async fn extract(&self, text: &str) -> Extraction {
        match self.ask_backend(text).await {
            Ok(entities) => Extraction::new(entities, ExtractionMethod::Ai),
            Err(e) => {
                warn!(
                    backend = %self.backend.name(),
                    error = %e,
                    "AI extraction failed, falling back to pattern rules"
                );
                Extraction::new(
                    self.fallback.extract_entities(text),
                    ExtractionMethod::PatternFallback {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    fn name(&self) -> &str {
        "ai"
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, MockBackend};
    use crate::traits::backend::BackendEntity;

    #[tokio::test]
    async fn test_backend_entities_are_validated() {
        let backend = MockBackend::new().with_entities(vec![
            BackendEntity::new("name", "Jane Doe", 0.9),
            BackendEntity::new("age", "twenty-nine", 0.9),
            BackendEntity::new("favorite_color", "blue", 0.9),
            BackendEntity::new("city", "Seattle", 1.7),
        ]);
        let extractor = AiExtractor::new(Arc::new(backend), PatternExtractor::default());

        let extraction = extractor.extract("irrelevant").await;

        assert_eq!(extraction.method, ExtractionMethod::Ai);
        assert_eq!(extraction.entities.len(), 2);
        let location = extraction.for_field(ProfileField::Location).next().unwrap();
        assert_eq!(location.strength, 1.0);
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let extractor = AiExtractor::new(
            Arc::new(FailingBackend::unavailable()),
            PatternExtractor::default(),
        );

        let extraction = extractor.extract("Jane Doe, 29, Seattle").await;

        assert!(extraction.is_fallback());
        assert_eq!(
            extraction.entities,
            PatternExtractor::default().extract_entities("Jane Doe, 29, Seattle")
        );
    }

    #[tokio::test]
    async fn test_all_invalid_entities_fall_back() {
        let backend =
            MockBackend::new().with_entities(vec![BackendEntity::new("shoe_size", "11", 0.9)]);
        let extractor = AiExtractor::new(Arc::new(backend), PatternExtractor::default());

        let extraction = extractor.extract("Jane Doe").await;
        assert!(extraction.is_fallback());
    }

    #[tokio::test]
    async fn test_empty_answer_is_not_a_failure() {
        let extractor =
            AiExtractor::new(Arc::new(MockBackend::new()), PatternExtractor::default());

        let extraction = extractor.extract("nothing here").await;
        assert_eq!(extraction.method, ExtractionMethod::Ai);
        assert!(extraction.entities.is_empty());
    }

    #[tokio::test]
    async fn test_text_is_truncated_for_backend() {
        let backend = Arc::new(MockBackend::new());
        let extractor = AiExtractor::new(backend.clone(), PatternExtractor::default())
            .with_max_text_len(5);

        extractor.extract("héllo world").await;
        assert_eq!(backend.calls(), vec!["héll".to_string()]);
    }

    #[test]
    fn test_truncate_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
