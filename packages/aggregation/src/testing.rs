//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the aggregation
//! library without making real network or AI calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{AdapterError, AdapterResult, BackendError, BackendResult};
use crate::traits::adapter::{FieldRequirement, SourceAdapter};
use crate::traits::backend::{BackendEntity, EntityBackend};
use crate::types::payload::{PayloadData, SourceRecord};
use crate::types::profile::SourceId;
use crate::types::query::{Query, QueryField};

/// What a [`MockAdapter`] does when fetched.
#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(AdapterResult<PayloadData>),
    Hang,
    Panic,
}

/// A mock source adapter.
///
/// Answers every fetch with a canned result after an optional delay, and
/// records each query it was called with.
///
/// # Example
///
/// ```rust
/// use aggregation::testing::MockAdapter;
/// use aggregation::types::payload::SourceRecord;
/// use aggregation::types::profile::ProfileField;
///
/// let adapter = MockAdapter::new("directory")
///     .with_record(SourceRecord::new(0.8).with(ProfileField::Name, "Jane Doe"));
/// assert_eq!(adapter.call_count(), 0);
/// ```
#[derive(Clone)]
pub struct MockAdapter {
    id: SourceId,
    requirement: FieldRequirement,
    timeout: Option<Duration>,
    delay: Option<Duration>,
    behavior: MockBehavior,
    calls: Arc<RwLock<Vec<Query>>>,
}

impl MockAdapter {
    /// A mock that accepts any non-empty query and finds nothing.
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            requirement: FieldRequirement::any_of(QueryField::ALL),
            timeout: None,
            delay: None,
            behavior: MockBehavior::Respond(Ok(PayloadData::Empty)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Answer with a structured record.
    pub fn with_record(self, record: SourceRecord) -> Self {
        self.with_response(Ok(PayloadData::Record(record)))
    }

    /// Answer with free text.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(Ok(PayloadData::Text(text.into())))
    }

    /// Fail with the given error.
    pub fn with_error(self, error: AdapterError) -> Self {
        self.with_response(Err(error))
    }

    pub fn with_response(mut self, response: AdapterResult<PayloadData>) -> Self {
        self.behavior = MockBehavior::Respond(response);
        self
    }

    /// Never answer.
    pub fn hanging(mut self) -> Self {
        self.behavior = MockBehavior::Hang;
        self
    }

    /// Panic inside the adapter task.
    pub fn panicking(mut self) -> Self {
        self.behavior = MockBehavior::Panic;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_requirement(mut self, requirement: FieldRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Number of fetches that reached this adapter.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Queries this adapter was fetched with.
    pub fn calls(&self) -> Vec<Query> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn requirement(&self) -> FieldRequirement {
        self.requirement.clone()
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch(&self, query: &Query) -> AdapterResult<PayloadData> {
        self.calls.write().unwrap().push(query.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Respond(response) => response.clone(),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Panic => panic!("mock adapter {} panicked", self.id),
        }
    }
}

/// A mock entity backend with canned entities.
#[derive(Default)]
pub struct MockBackend {
    entities: Vec<BackendEntity>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockBackend {
    /// A backend that answers with no entities.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entities: Vec<BackendEntity>) -> Self {
        self.entities = entities;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts this backend was asked about.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl EntityBackend for MockBackend {
    async fn extract_entities(&self, text: &str) -> BackendResult<Vec<BackendEntity>> {
        self.calls.write().unwrap().push(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.entities.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A backend that always fails.
pub struct FailingBackend {
    error: fn(String) -> BackendError,
    message: String,
}

impl FailingBackend {
    pub fn unavailable() -> Self {
        Self {
            error: BackendError::Unavailable,
            message: "connection refused".to_string(),
        }
    }

    pub fn malformed() -> Self {
        Self {
            error: BackendError::Malformed,
            message: "expected JSON object".to_string(),
        }
    }
}

#[async_trait]
impl EntityBackend for FailingBackend {
    async fn extract_entities(&self, _text: &str) -> BackendResult<Vec<BackendEntity>> {
        Err((self.error)(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
