//! Aggregation pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Adapter selection from the registry
//! - Concurrent fan-out under one run deadline
//! - Entity extraction for free-text payloads
//! - Correlation into one profile with confidence and provenance

pub mod aggregate;
pub mod correlate;
pub mod orchestrator;
pub mod registry;

pub use aggregate::AggregateResult;
pub use correlate::{
    Alternative, CorrelatedProfile, Correlator, FieldAssertion, ListEntry, ResolvedField,
};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use registry::AdapterRegistry;
