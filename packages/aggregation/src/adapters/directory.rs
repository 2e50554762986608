//! In-memory people directory adapter.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::adapters::record::PersonRecord;
use crate::error::{AdapterError, AdapterResult, AggregationError, Result};
use crate::traits::adapter::{FieldRequirement, SourceAdapter};
use crate::types::payload::PayloadData;
use crate::types::profile::SourceId;
use crate::types::query::{Query, QueryField};

/// Adapter over an owned, in-process list of person records.
///
/// Stands in for any locally held dataset (an export, a CRM dump). The
/// best-matching record wins: most agreeing identifiers, first inserted on
/// ties.
///
/// # Example
///
/// ```rust
/// use aggregation::adapters::{DirectoryAdapter, PersonRecord};
///
/// let directory = DirectoryAdapter::new("directory");
/// directory.insert(PersonRecord::named("Jane Doe")).unwrap();
/// assert_eq!(directory.len(), 1);
/// ```
#[derive(Clone)]
pub struct DirectoryAdapter {
    id: SourceId,
    strength: f32,
    entries: Arc<RwLock<Vec<PersonRecord>>>,
}

impl DirectoryAdapter {
    /// Create an empty directory with strength 0.8.
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            strength: 0.8,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load a JSON array of [`PersonRecord`]s.
    pub fn from_json_file(id: impl Into<SourceId>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AggregationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let records: Vec<PersonRecord> = serde_json::from_str(&raw).map_err(|e| {
            AggregationError::Config(format!("invalid directory file {}: {}", path.display(), e))
        })?;

        let directory = Self::new(id);
        for record in records {
            directory
                .insert(record)
                .map_err(|e| AggregationError::Config(e.to_string()))?;
        }
        Ok(directory)
    }

    /// Set the strength reported with every record.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_record(self, record: PersonRecord) -> Self {
        if let Err(e) = self.insert(record) {
            warn!(source = %self.id, error = %e, "Record not added");
        }
        self
    }

    pub fn insert(&self, record: PersonRecord) -> AdapterResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AdapterError::unreachable("directory lock poisoned"))?;
        entries.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best match for the query, if any record agrees on an identifier.
    pub fn lookup(&self, query: &Query) -> AdapterResult<Option<PersonRecord>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AdapterError::unreachable("directory lock poisoned"))?;

        let mut best: Option<(usize, &PersonRecord)> = None;
        for entry in entries.iter() {
            match entry.match_score(query) {
                Some(score) if score > 0 && best.map_or(true, |(b, _)| score > b) => {
                    best = Some((score, entry));
                }
                _ => {}
            }
        }
        Ok(best.map(|(_, entry)| entry.clone()))
    }
}

#[async_trait]
impl SourceAdapter for DirectoryAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn requirement(&self) -> FieldRequirement {
        FieldRequirement::any_of([
            QueryField::Name,
            QueryField::Email,
            QueryField::Phone,
            QueryField::Username,
            QueryField::Address,
        ])
    }

    async fn fetch(&self, query: &Query) -> AdapterResult<PayloadData> {
        let found = self.lookup(query)?;
        debug!(source = %self.id, matched = found.is_some(), "Directory lookup");

        match found {
            Some(person) => Ok(PayloadData::Record(person.to_source_record(self.strength))),
            None => Err(AdapterError::NoMatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::ProfileField;

    fn directory() -> DirectoryAdapter {
        DirectoryAdapter::new("directory")
            .with_record(PersonRecord {
                name: Some("Jane Doe".into()),
                location: Some("Seattle".into()),
                ..Default::default()
            })
            .with_record(PersonRecord {
                name: Some("Jane Doe".into()),
                location: Some("Austin".into()),
                emails: vec!["jane@example.com".into()],
                ..Default::default()
            })
    }

    #[tokio::test]
    async fn test_best_match_wins() {
        let query = Query::new()
            .with_name("Jane Doe")
            .with_email("jane@example.com");

        let PayloadData::Record(record) = directory().search(&query).await.unwrap() else {
            panic!("expected record");
        };
        assert_eq!(
            record.values(ProfileField::Location).next().unwrap().to_string(),
            "Austin"
        );
    }

    #[tokio::test]
    async fn test_first_inserted_wins_ties() {
        let query = Query::new().with_name("jane doe");

        let PayloadData::Record(record) = directory().search(&query).await.unwrap() else {
            panic!("expected record");
        };
        assert_eq!(
            record.values(ProfileField::Location).next().unwrap().to_string(),
            "Seattle"
        );
    }

    #[tokio::test]
    async fn test_no_match() {
        let result = directory()
            .search(&Query::new().with_name("Richard Roe"))
            .await;
        assert!(matches!(result, Err(AdapterError::NoMatch)));
    }

    #[tokio::test]
    async fn test_location_only_query_is_missing_input() {
        let result = directory()
            .search(&Query::new().with_location("Seattle"))
            .await;
        assert!(matches!(result, Err(AdapterError::MissingInput { .. })));
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "aggregation-directory-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, r#"[{"name":"Jane Doe","age":29},{"name":"John Smith"}]"#)
            .unwrap();

        let directory = DirectoryAdapter::from_json_file("file", &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(directory.len(), 2);
        assert!(DirectoryAdapter::from_json_file("file", &path).is_err());
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let directory = DirectoryAdapter::new("directory");
        let entries = directory.entries.clone();
        let _ = std::thread::spawn(move || {
            let _guard = entries.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(directory.insert(PersonRecord::named("Jane Doe")).is_err());
        assert!(directory
            .lookup(&Query::new().with_name("Jane Doe"))
            .is_err());
    }
}
