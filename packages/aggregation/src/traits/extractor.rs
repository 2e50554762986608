//! Entity extractor trait.
//!
//! Both strategies (AI-assisted and pattern-based) implement this, so the
//! orchestrator never knows which one it holds.

use async_trait::async_trait;

use crate::types::entity::Extraction;

/// Turns free text into candidate profile fields.
///
/// Extraction never fails: a strategy that cannot do its job degrades to a
/// simpler one and says so in [`Extraction::method`]. Given the same text
/// and configuration, results are the same.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Extraction;

    /// Strategy name (for logging/debugging).
    fn name(&self) -> &str;
}
