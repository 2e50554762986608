//! Entity extraction strategies.
//!
//! - [`PatternExtractor`] - deterministic rules with a fixed strength cap
//! - [`AiExtractor`] - backend-assisted, falling back to the pattern rules

pub mod ai;
pub mod gazetteer;
pub mod pattern;

use std::sync::Arc;
use tracing::warn;

use crate::traits::backend::EntityBackend;
use crate::traits::extractor::EntityExtractor;
use crate::types::config::{ExtractorKind, OrchestratorConfig};

pub use ai::AiExtractor;
pub use pattern::PatternExtractor;

/// Build the extractor selected by `config`.
///
/// Choosing [`ExtractorKind::Ai`] without a backend logs a warning and uses
/// the pattern rules.
pub fn build_extractor(
    config: &OrchestratorConfig,
    backend: Option<Arc<dyn EntityBackend>>,
) -> Arc<dyn EntityExtractor> {
    let pattern = PatternExtractor::new(config.pattern_strength);

    match (config.extractor, backend) {
        (ExtractorKind::Ai, Some(backend)) => Arc::new(
            AiExtractor::new(backend, pattern).with_max_text_len(config.max_text_len),
        ),
        (ExtractorKind::Ai, None) => {
            warn!("AI extractor selected but no backend configured, using pattern rules");
            Arc::new(pattern)
        }
        (ExtractorKind::Pattern, _) => Arc::new(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[test]
    fn test_build_extractor_selection() {
        let ai = OrchestratorConfig::default().with_extractor(ExtractorKind::Ai);
        let backend: Arc<dyn EntityBackend> = Arc::new(MockBackend::new());

        assert_eq!(build_extractor(&ai, Some(backend.clone())).name(), "ai");
        assert_eq!(build_extractor(&ai, None).name(), "pattern");
        assert_eq!(
            build_extractor(&OrchestratorConfig::default(), Some(backend)).name(),
            "pattern"
        );
    }
}
