//! Adapter registry.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::error::{AggregationError, Result};
use crate::traits::adapter::SourceAdapter;
use crate::types::profile::SourceId;
use crate::types::query::Query;

/// Registered adapters, in registration order, keyed by source id.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: IndexMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter. Ids must be unique, and `query` is reserved.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Result<()> {
        let id = adapter.id().clone();
        if self.adapters.contains_key(&id) || id.as_str() == SourceId::QUERY {
            return Err(AggregationError::DuplicateSource { id: id.to_string() });
        }
        self.adapters.insert(id, adapter);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, adapter: impl SourceAdapter + 'static) -> Result<Self> {
        self.register(Arc::new(adapter))?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(id)
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.adapters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Split adapters into those the query can feed and those it cannot.
    pub fn partition(&self, query: &Query) -> (Vec<Arc<dyn SourceAdapter>>, Vec<SourceId>) {
        let mut eligible = Vec::new();
        let mut skipped = Vec::new();
        for (id, adapter) in &self.adapters {
            if adapter.requirement().is_satisfied_by(query) {
                eligible.push(adapter.clone());
            } else {
                skipped.push(id.clone());
            }
        }
        (eligible, skipped)
    }

    /// Adapters whose requirement the query satisfies.
    pub fn eligible(&self, query: &Query) -> Vec<Arc<dyn SourceAdapter>> {
        self.partition(query).0
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}
