//! Orchestrator: one query in, a deadline-bounded set of payloads out.
//!
//! Every eligible adapter runs as its own task. All tasks share one
//! [`CancellationToken`] that a timer cancels when the run deadline elapses.
//! Settled tasks report over a channel to a single collector, which is the
//! only writer of the [`RunReport`]. The run returns once every task has
//! settled.

use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AdapterError, AggregationError, Result};
use crate::pipeline::aggregate::AggregateResult;
use crate::pipeline::correlate::{Correlator, FieldAssertion};
use crate::pipeline::registry::AdapterRegistry;
use crate::traits::adapter::SourceAdapter;
use crate::traits::extractor::EntityExtractor;
use crate::types::config::OrchestratorConfig;
use crate::types::entity::Extraction;
use crate::types::payload::{PayloadData, SourcePayload};
use crate::types::profile::SourceId;
use crate::types::query::Query;
use crate::types::report::{AdapterRun, AdapterStatus, RunReport};

/// Everything one run collected, before correlation.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Raw payloads in completion order.
    pub payloads: IndexMap<SourceId, SourcePayload>,

    /// Assertions from structured records and extracted entities.
    pub assertions: Vec<FieldAssertion>,

    pub report: RunReport,
}

/// One adapter task's result, sent to the collector.
struct Settled {
    source: SourceId,
    payload: SourcePayload,
    extraction: Option<Extraction>,
    elapsed: Duration,
}

/// Coordinates adapters, extraction and correlation for a run.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(registry, extractor, OrchestratorConfig::default());
/// let result = orchestrator.run(Query::new().with_name("Jane Doe")).await?;
/// println!("{}", serde_json::to_string_pretty(&result)?);
/// ```
pub struct Orchestrator {
    registry: AdapterRegistry,
    extractor: Arc<dyn EntityExtractor>,
    correlator: Correlator,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        registry: AdapterRegistry,
        extractor: Arc<dyn EntityExtractor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            extractor,
            correlator: Correlator::new(),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Ids of every registered adapter, in registration order.
    pub fn sources(&self) -> Vec<SourceId> {
        self.registry.ids()
    }

    /// Run a full aggregation: collect, correlate, assemble.
    ///
    /// Only [`AggregationError::InvalidQuery`] is returned as an error;
    /// adapter failures end up in the report.
    pub async fn run(&self, query: Query) -> Result<AggregateResult> {
        let outcome = self.collect(&query).await?;

        let mut profile = self.correlator.correlate(&outcome.assertions);
        profile.seed_from_query(&query);

        Ok(AggregateResult::new(query, outcome, profile))
    }

    /// Fan the query out to every eligible adapter and wait for all of them.
    pub async fn collect(&self, query: &Query) -> Result<RunOutcome> {
        query.validate()?;

        let (eligible, skipped) = self.registry.partition(query);
        let deadline = self.config.run_deadline;
        let mut report = RunReport::start(query.fingerprint(), deadline.as_millis() as u64);
        report.skipped = skipped;

        info!(
            run_id = %report.run_id,
            fingerprint = %report.fingerprint,
            eligible = eligible.len(),
            skipped = report.skipped.len(),
            deadline_ms = report.deadline_ms,
            "Aggregation run starting"
        );

        let settled = self.fan_out(eligible, query).await;

        let mut payloads = IndexMap::new();
        let mut assertions = Vec::new();
        for s in settled {
            assertions.extend(assertions_for(&s));
            report.record(adapter_run(&s));
            payloads.insert(s.source, s.payload);
        }
        report.finish();

        info!(
            run_id = %report.run_id,
            fingerprint = %report.fingerprint,
            succeeded = report.succeeded(),
            failed = report.failed(),
            partial = report.partial,
            elapsed_ms = report.duration_ms(),
            "Aggregation run complete"
        );

        Ok(RunOutcome {
            payloads,
            assertions,
            report,
        })
    }

    /// Run one named adapter under the same deadline and extraction rules.
    pub async fn search_source(&self, id: &str, query: &Query) -> Result<SourcePayload> {
        query.validate()?;
        let adapter = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| AggregationError::UnknownSource { id: id.to_string() })?;

        let mut settled = self.fan_out(vec![adapter], query).await;
        settled
            .pop()
            .map(|s| s.payload)
            .ok_or_else(|| AggregationError::UnknownSource { id: id.to_string() })
    }

    /// Spawn one task per adapter and collect them in completion order.
    async fn fan_out(
        &self,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        query: &Query,
    ) -> Vec<Settled> {
        let deadline = Instant::now() + self.config.run_deadline;
        let cancel = CancellationToken::new();
        let query = Arc::new(query.clone());
        let (tx, mut rx) = mpsc::unbounded_channel::<Settled>();

        let timer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                cancel.cancel();
            })
        };

        let mut handles = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let source = adapter.id().clone();
            let task = run_adapter(
                adapter,
                query.clone(),
                self.extractor.clone(),
                cancel.clone(),
                deadline,
            );
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let _ = tx.send(task.await);
            });
            handles.push((source, handle));
        }
        drop(tx);

        // Single collector; the channel closes once every task has finished
        let mut settled = Vec::with_capacity(handles.len());
        while let Some(s) = rx.recv().await {
            debug!(
                source = %s.source,
                status = ?AdapterStatus::of(&s.payload),
                elapsed_ms = s.elapsed.as_millis() as u64,
                "Adapter settled"
            );
            settled.push(s);
        }

        // A panicked task never sent; report it as unreachable
        let sources: Vec<SourceId> = handles.iter().map(|(s, _)| s.clone()).collect();
        let joined = futures::future::join_all(handles.into_iter().map(|(_, h)| h)).await;
        for (source, result) in sources.into_iter().zip(joined) {
            if let Err(e) = result {
                warn!(source = %source, error = %e, "Adapter task failed");
                settled.push(Settled {
                    source,
                    payload: SourcePayload::from_result(Err(AdapterError::unreachable(format!(
                        "adapter task failed: {}",
                        e
                    )))),
                    extraction: None,
                    elapsed: Duration::ZERO,
                });
            }
        }

        timer.abort();
        settled
    }
}

/// One adapter invocation, bounded by the shared token and its own timeout.
async fn run_adapter(
    adapter: Arc<dyn SourceAdapter>,
    query: Arc<Query>,
    extractor: Arc<dyn EntityExtractor>,
    cancel: CancellationToken,
    deadline: Instant,
) -> Settled {
    let source = adapter.id().clone();
    let started = Instant::now();

    let remaining = deadline.saturating_duration_since(started);
    let budget = adapter.timeout().map_or(remaining, |t| t.min(remaining));

    let result = tokio::select! {
        _ = cancel.cancelled() => Err(AdapterError::timeout("run deadline elapsed")),
        r = tokio::time::timeout(budget, adapter.search(&query)) => r.unwrap_or_else(|_| {
            Err(AdapterError::timeout(format!(
                "no answer within {}ms",
                budget.as_millis()
            )))
        }),
    };

    let (payload, extraction) = match result {
        Ok(data) => {
            // Outer None: cancelled mid-extraction. Inner None: nothing to extract.
            let extraction = match data.text() {
                Some(text) => tokio::select! {
                    _ = cancel.cancelled() => None,
                    e = extractor.extract(text) => Some(Some(e)),
                },
                None => Some(None),
            };
            match extraction {
                Some(extraction) => (SourcePayload::success(data), extraction),
                // The payload is discarded, not half-merged
                None => (
                    SourcePayload::from_result(Err(AdapterError::timeout(
                        "run deadline elapsed during extraction",
                    ))),
                    None,
                ),
            }
        }
        Err(e) => {
            if !matches!(e, AdapterError::NoMatch) {
                warn!(source = %source, error = %e, "Adapter failed");
            }
            (SourcePayload::from_result(Err(e)), None)
        }
    };

    Settled {
        source,
        payload,
        extraction,
        elapsed: started.elapsed(),
    }
}

fn assertions_for(settled: &Settled) -> Vec<FieldAssertion> {
    let fetched_at = settled.payload.fetched_at();
    match (settled.payload.data(), &settled.extraction) {
        (Some(PayloadData::Record(record)), _) => {
            FieldAssertion::from_record(&settled.source, record, fetched_at)
        }
        (Some(PayloadData::Text(_)), Some(extraction)) => {
            FieldAssertion::from_entities(&settled.source, &extraction.entities, fetched_at)
        }
        _ => Vec::new(),
    }
}

fn adapter_run(settled: &Settled) -> AdapterRun {
    let message = match &settled.payload {
        SourcePayload::Failure { message, .. } => Some(message.clone()),
        SourcePayload::Success { .. } => None,
    };

    AdapterRun {
        source: settled.source.clone(),
        status: AdapterStatus::of(&settled.payload),
        message,
        extraction: settled.extraction.as_ref().map(|e| e.method.clone()),
        entities_extracted: settled
            .extraction
            .as_ref()
            .map_or(0, |e| e.entities.len()),
        elapsed_ms: settled.elapsed.as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{AiExtractor, PatternExtractor};
    use crate::testing::{MockAdapter, MockBackend};
    use crate::types::payload::{FailureKind, SourceRecord};
    use crate::types::profile::ProfileField;

    fn orchestrator(registry: AdapterRegistry, deadline: Duration) -> Orchestrator {
        Orchestrator::new(
            registry,
            Arc::new(PatternExtractor::default()),
            OrchestratorConfig::default().with_deadline(deadline),
        )
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_adapters_run() {
        let spy = MockAdapter::new("spy");
        let registry = AdapterRegistry::new().with(spy.clone()).unwrap();

        let result = orchestrator(registry, Duration::from_secs(1))
            .collect(&Query::new().with_name("  "))
            .await;

        assert!(matches!(result, Err(AggregationError::InvalidQuery { .. })));
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_report_in_completion_order() {
        let registry = AdapterRegistry::new()
            .with(MockAdapter::new("slow").with_delay(Duration::from_millis(80)))
            .unwrap()
            .with(MockAdapter::new("fast"))
            .unwrap();

        let outcome = orchestrator(registry, Duration::from_secs(2))
            .collect(&Query::new().with_name("Jane Doe"))
            .await
            .unwrap();

        let order: Vec<&str> = outcome.report.adapters.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(order, vec!["fast", "slow"]);
        assert_eq!(outcome.payloads.len(), 2);
    }

    #[tokio::test]
    async fn test_adapter_self_timeout_is_respected() {
        let registry = AdapterRegistry::new()
            .with(
                MockAdapter::new("tight")
                    .hanging()
                    .with_timeout(Duration::from_millis(20)),
            )
            .unwrap();

        let started = std::time::Instant::now();
        let outcome = orchestrator(registry, Duration::from_secs(5))
            .collect(&Query::new().with_name("Jane Doe"))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            outcome.payloads["tight"].failure_kind(),
            Some(FailureKind::Unreachable { timeout: true })
        );
        assert!(outcome.report.partial);
    }

    #[tokio::test]
    async fn test_blank_text_skips_extraction() {
        let backend = Arc::new(MockBackend::new());
        let extractor = AiExtractor::new(backend.clone(), PatternExtractor::default());
        let registry = AdapterRegistry::new()
            .with(MockAdapter::new("blank").with_text("  \n\t "))
            .unwrap();
        let orchestrator = Orchestrator::new(
            registry,
            Arc::new(extractor),
            OrchestratorConfig::default().with_deadline(Duration::from_secs(1)),
        );

        let outcome = orchestrator
            .collect(&Query::new().with_name("Jane Doe"))
            .await
            .unwrap();

        assert!(backend.calls().is_empty());
        let blank = outcome.report.entry("blank").unwrap();
        assert_eq!(blank.status, AdapterStatus::Success);
        assert!(blank.extraction.is_none());
        assert!(outcome.assertions.is_empty());
    }

    #[tokio::test]
    async fn test_text_payload_is_extracted() {
        let registry = AdapterRegistry::new()
            .with(MockAdapter::new("web").with_text("Jane Doe, 29, Seattle"))
            .unwrap()
            .with(
                MockAdapter::new("dir")
                    .with_record(SourceRecord::new(0.9).with(ProfileField::Name, "Jane Doe")),
            )
            .unwrap();

        let outcome = orchestrator(registry, Duration::from_secs(2))
            .collect(&Query::new().with_name("Jane Doe"))
            .await
            .unwrap();

        let web = outcome.report.entry("web").unwrap();
        assert_eq!(web.entities_extracted, 3);
        assert!(web.extraction.is_some());
        assert!(outcome.report.entry("dir").unwrap().extraction.is_none());
        assert_eq!(outcome.assertions.len(), 4);
    }

    #[tokio::test]
    async fn test_search_source() {
        let registry = AdapterRegistry::new()
            .with(MockAdapter::new("dir").with_error(AdapterError::Blocked("429".into())))
            .unwrap();
        let orchestrator = orchestrator(registry, Duration::from_secs(1));
        let query = Query::new().with_name("Jane Doe");

        let payload = orchestrator.search_source("dir", &query).await.unwrap();
        assert_eq!(payload.failure_kind(), Some(FailureKind::Blocked));

        assert!(matches!(
            orchestrator.search_source("nope", &query).await,
            Err(AggregationError::UnknownSource { .. })
        ));
        assert_eq!(orchestrator.sources(), vec![SourceId::from("dir")]);
    }
}
