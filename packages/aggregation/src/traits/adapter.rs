//! Source adapter trait: one external data source behind a uniform contract.
//!
//! Adapters wrap a single source (a people directory, a search API, a
//! records service) and translate its answer into [`PayloadData`]. The
//! orchestrator only ever talks to this trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggregation::traits::adapter::{FieldRequirement, SourceAdapter};
//!
//! // Fast-fails with MissingInput when the query has neither field
//! let data = adapter.search(&query).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AdapterError, AdapterResult};
use crate::types::payload::PayloadData;
use crate::types::profile::SourceId;
use crate::types::query::{Query, QueryField};

/// Query fields an adapter needs before it can do anything useful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fields", rename_all = "snake_case")]
pub enum FieldRequirement {
    /// At least one of these fields must be populated
    AnyOf(Vec<QueryField>),

    /// Every one of these fields must be populated
    AllOf(Vec<QueryField>),
}

impl FieldRequirement {
    /// Requirement satisfied by any one of `fields`.
    pub fn any_of(fields: impl IntoIterator<Item = QueryField>) -> Self {
        Self::AnyOf(fields.into_iter().collect())
    }

    /// Requirement satisfied only when all of `fields` are present.
    pub fn all_of(fields: impl IntoIterator<Item = QueryField>) -> Self {
        Self::AllOf(fields.into_iter().collect())
    }

    /// Check whether the query carries what this requirement needs.
    pub fn is_satisfied_by(&self, query: &Query) -> bool {
        match self {
            FieldRequirement::AnyOf(fields) => fields.iter().any(|f| query.has(*f)),
            FieldRequirement::AllOf(fields) => {
                !fields.is_empty() && fields.iter().all(|f| query.has(*f))
            }
        }
    }

    /// The fields named by this requirement.
    pub fn fields(&self) -> &[QueryField] {
        match self {
            FieldRequirement::AnyOf(fields) | FieldRequirement::AllOf(fields) => fields,
        }
    }
}

/// Source adapter trait.
///
/// Implementations must be safe to call concurrently with other adapters
/// and must not assume exclusive access to the query.
///
/// - `DirectoryAdapter` - In-memory people directory
/// - `HttpJsonAdapter` - JSON people-search API
/// - `WebSearchAdapter` - Web search, answered as free text
/// - `MockAdapter` - For testing
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable id of this source, unique within a registry.
    fn id(&self) -> &SourceId;

    /// Query fields this adapter needs.
    fn requirement(&self) -> FieldRequirement;

    /// A tighter timeout than the run deadline, if the source wants one.
    ///
    /// The orchestrator uses the minimum of this and the remaining deadline.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Query the source.
    ///
    /// Called only with a query that satisfies [`requirement`]. Returns
    /// `Err(AdapterError::NoMatch)` or `Ok(PayloadData::Empty)` when the
    /// source was reached and found nothing.
    ///
    /// [`requirement`]: SourceAdapter::requirement
    async fn fetch(&self, query: &Query) -> AdapterResult<PayloadData>;

    /// Check the requirement, then fetch.
    ///
    /// A query with none of the required fields is a caller error and fails
    /// without touching the network.
    async fn search(&self, query: &Query) -> AdapterResult<PayloadData> {
        let requirement = self.requirement();
        if !requirement.is_satisfied_by(query) {
            return Err(AdapterError::MissingInput {
                required: requirement.fields().to_vec(),
            });
        }
        self.fetch(query).await
    }
}
