//! Multi-Source Identity Aggregation Library
//!
//! Resolves a partial identity query (a name, email, username or phone
//! fragment) into one corroborated profile by querying many independent,
//! unreliable sources concurrently and reconciling their answers.
//!
//! # Design Philosophy
//!
//! - Partial results are a feature: failing sources never block the rest
//! - Every profile value carries a confidence and its contributing sources
//! - Free text is turned into fields by a pluggable extractor (AI or patterns)
//! - Library handles mechanics, app handles sources and storage
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggregation::{AdapterRegistry, Orchestrator, OrchestratorConfig, Query};
//! use aggregation::adapters::DirectoryAdapter;
//! use aggregation::extract::build_extractor;
//!
//! let mut registry = AdapterRegistry::new();
//! registry.register(Arc::new(DirectoryAdapter::from_json_file("directory", "people.json")?))?;
//!
//! let config = OrchestratorConfig::default();
//! let extractor = build_extractor(&config, None);
//! let orchestrator = Orchestrator::new(registry, extractor, config);
//!
//! let result = orchestrator.run(Query::new().with_name("Jane Doe")).await?;
//! if let Some(name) = result.profile.get(ProfileField::Name) {
//!     println!("{} ({:.2})", name.value, name.confidence);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (SourceAdapter, EntityBackend, EntityExtractor)
//! - [`types`] - Query, payload, profile and report types
//! - [`adapters`] - Reference source adapters
//! - [`extract`] - Pattern and AI-assisted extraction strategies
//! - [`pipeline`] - Orchestration and correlation
//! - [`ai`] - OpenAI-compatible entity backend
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod adapters;
pub mod ai;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{AdapterError, AggregationError, BackendError};
pub use traits::{
    adapter::{FieldRequirement, SourceAdapter},
    backend::{BackendEntity, EntityBackend},
    extractor::EntityExtractor,
};
pub use types::{
    config::{ExtractorKind, OrchestratorConfig},
    entity::{ExtractedEntity, Extraction, ExtractionMethod},
    payload::{FailureKind, PayloadData, SourcePayload, SourceRecord},
    profile::{AgeRange, FieldValue, ProfileField, SourceId},
    query::{Query, QueryField},
    report::{AdapterRun, AdapterStatus, RunReport},
};

// Re-export pipeline components
pub use pipeline::{
    AdapterRegistry, AggregateResult, CorrelatedProfile, Correlator, FieldAssertion,
    Orchestrator, ResolvedField,
};

// Re-export extractors
pub use extract::{build_extractor, AiExtractor, PatternExtractor};

// Re-export testing utilities
pub use testing::{FailingBackend, MockAdapter, MockBackend};
