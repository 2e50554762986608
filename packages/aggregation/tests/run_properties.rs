//! Integration tests for run-level guarantees.
//!
//! These tests drive the public API with mock adapters and verify:
//! 1. Empty queries are rejected before any adapter runs
//! 2. A run waits for every adapter, whatever its latency
//! 3. The run deadline bounds a run with a hanging adapter
//! 4. Failing sources never abort a run

use std::sync::Arc;
use std::time::{Duration, Instant};

use aggregation::{
    AdapterError, AdapterRegistry, AdapterStatus, AggregationError, AiExtractor, BackendEntity,
    FailureKind, FieldRequirement, MockAdapter, MockBackend, Orchestrator, OrchestratorConfig,
    PatternExtractor, ProfileField, Query, QueryField, SourceRecord,
};

/// Helper to build an orchestrator over the given adapters.
fn orchestrator(adapters: Vec<MockAdapter>, deadline: Duration) -> Orchestrator {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(Arc::new(adapter)).unwrap();
    }
    Orchestrator::new(
        registry,
        Arc::new(PatternExtractor::default()),
        OrchestratorConfig::default().with_deadline(deadline),
    )
}

fn record(name: &str, strength: f32) -> SourceRecord {
    SourceRecord::new(strength).with(ProfileField::Name, name)
}

#[tokio::test]
async fn test_empty_query_invokes_no_adapter() {
    let spies: Vec<MockAdapter> = (0..3).map(|i| MockAdapter::new(format!("spy-{}", i))).collect();
    let orchestrator = orchestrator(spies.clone(), Duration::from_secs(1));

    for query in [Query::new(), Query::new().with_email(" ").with_name("")] {
        let result = orchestrator.run(query).await;
        assert!(matches!(result, Err(AggregationError::InvalidQuery { .. })));
    }

    assert!(spies.iter().all(|spy| spy.call_count() == 0));
}

#[tokio::test]
async fn test_run_waits_for_every_adapter() {
    let latencies = [0u64, 30, 60, 120];
    let adapters: Vec<MockAdapter> = latencies
        .iter()
        .map(|ms| {
            MockAdapter::new(format!("after-{}ms", ms))
                .with_delay(Duration::from_millis(*ms))
                .with_record(record("Jane Doe", 0.5))
        })
        .collect();

    let started = Instant::now();
    let result = orchestrator(adapters.clone(), Duration::from_secs(5))
        .run(Query::new().with_name("Jane Doe"))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(120));
    assert_eq!(result.report.adapters.len(), latencies.len());
    assert_eq!(result.report.succeeded(), latencies.len());
    assert!(!result.report.partial);
    assert!(adapters.iter().all(|a| a.call_count() == 1));

    let name = result.profile.get(ProfileField::Name).unwrap();
    assert_eq!(name.contributing_sources.len(), latencies.len());
}

#[tokio::test]
async fn test_deadline_bounds_hanging_adapter() {
    let adapters = vec![
        MockAdapter::new("hangs").hanging(),
        MockAdapter::new("answers").with_record(record("Jane Doe", 0.9)),
    ];

    let started = Instant::now();
    let result = orchestrator(adapters, Duration::from_millis(100))
        .run(Query::new().with_name("Jane Doe"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(90), "returned early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1000), "did not honor deadline: {:?}", elapsed);

    let hung = result.report.entry("hangs").unwrap();
    assert!(hung.status.is_timeout());
    assert_eq!(
        result.sources["hangs"].failure_kind(),
        Some(FailureKind::Unreachable { timeout: true })
    );
    assert!(result.report.partial);
    assert_eq!(result.report.entry("answers").unwrap().status, AdapterStatus::Success);
}

#[tokio::test]
async fn test_deadline_during_extraction_discards_payload() {
    let backend = MockBackend::new()
        .with_entities(vec![BackendEntity::new("age", "29", 0.9)])
        .with_delay(Duration::from_secs(5));
    let extractor = AiExtractor::new(Arc::new(backend), PatternExtractor::default());

    let mut registry = AdapterRegistry::new();
    registry
        .register(Arc::new(MockAdapter::new("slow-text").with_text("Jane Doe, 29, Seattle")))
        .unwrap();
    registry
        .register(Arc::new(MockAdapter::new("answers").with_record(record("Jane Doe", 0.9))))
        .unwrap();
    let orchestrator = Orchestrator::new(
        registry,
        Arc::new(extractor),
        OrchestratorConfig::default().with_deadline(Duration::from_millis(100)),
    );

    let started = Instant::now();
    let result = orchestrator
        .run(Query::new().with_name("Jane Doe"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(1), "extraction outlived deadline: {:?}", elapsed);
    assert_eq!(
        result.sources["slow-text"].failure_kind(),
        Some(FailureKind::Unreachable { timeout: true })
    );
    let slow = result.report.entry("slow-text").unwrap();
    assert!(slow.status.is_timeout());
    assert_eq!(slow.entities_extracted, 0);
    assert!(result.report.partial);

    // Nothing from the cut-off source reaches the profile
    assert!(!result.profile.contains(ProfileField::Age));
    assert!(!result.profile.contains(ProfileField::Location));
    let name = result.profile.get(ProfileField::Name).unwrap();
    assert_eq!(name.contributing_sources.len(), 1);
    assert_eq!(name.contributing_sources.iter().next().unwrap().as_str(), "answers");
}

#[tokio::test]
async fn test_panicking_adapter_is_unreachable() {
    let adapters = vec![
        MockAdapter::new("boom").panicking(),
        MockAdapter::new("answers").with_record(record("Jane Doe", 0.9)),
    ];

    let result = orchestrator(adapters, Duration::from_secs(1))
        .run(Query::new().with_name("Jane Doe"))
        .await
        .unwrap();

    assert_eq!(
        result.report.entry("boom").unwrap().status,
        AdapterStatus::Failed {
            kind: FailureKind::Unreachable { timeout: false }
        }
    );
    assert!(!result.report.partial);
    assert_eq!(result.report.entry("answers").unwrap().status, AdapterStatus::Success);

    let name = result.profile.get(ProfileField::Name).unwrap();
    assert_eq!(name.contributing_sources.len(), 1);
    assert_eq!(name.contributing_sources.iter().next().unwrap().as_str(), "answers");
}

#[tokio::test]
async fn test_all_failures_still_return_profile() {
    let adapters = vec![
        MockAdapter::new("down").with_error(AdapterError::unreachable("connection refused")),
        MockAdapter::new("blocked").with_error(AdapterError::Blocked("HTTP 429".into())),
        MockAdapter::new("garbled").with_error(AdapterError::Malformed("expected JSON".into())),
        MockAdapter::new("empty").with_error(AdapterError::NoMatch),
    ];

    let result = orchestrator(adapters, Duration::from_secs(1))
        .run(Query::new().with_name("Jane Doe").with_location("Seattle"))
        .await
        .unwrap();

    assert_eq!(result.report.failed(), 3);
    assert_eq!(result.report.entry("empty").unwrap().status, AdapterStatus::NoMatch);
    assert_eq!(
        result.report.entry("blocked").unwrap().status,
        AdapterStatus::Failed {
            kind: FailureKind::Blocked
        }
    );
    assert!(!result.has_data());

    // Query fields come back with zero confidence
    let name = result.profile.get(ProfileField::Name).unwrap();
    assert_eq!(name.confidence, 0.0);
    assert_eq!(name.contributing_sources.iter().next().unwrap().as_str(), "query");
    assert!(result.profile.get(ProfileField::Location).is_some());
    assert!(!result.profile.contains(ProfileField::Age));
}

#[tokio::test]
async fn test_ineligible_adapters_are_skipped() {
    let by_email = MockAdapter::new("by-email")
        .with_requirement(FieldRequirement::any_of([QueryField::Email]));
    let by_name = MockAdapter::new("by-name").with_record(record("Jane Doe", 0.8));

    let result = orchestrator(vec![by_email.clone(), by_name], Duration::from_secs(1))
        .run(Query::new().with_name("Jane Doe"))
        .await
        .unwrap();

    assert_eq!(by_email.call_count(), 0);
    assert_eq!(result.report.skipped.len(), 1);
    assert_eq!(result.report.skipped[0].as_str(), "by-email");
    assert!(result.report.entry("by-email").is_none());
}

#[tokio::test]
async fn test_search_source_missing_input_fails_fast() {
    let by_email = MockAdapter::new("by-email")
        .with_requirement(FieldRequirement::any_of([QueryField::Email]));
    let orchestrator = orchestrator(vec![by_email.clone()], Duration::from_secs(1));

    let payload = orchestrator
        .search_source("by-email", &Query::new().with_name("Jane Doe"))
        .await
        .unwrap();

    assert_eq!(payload.failure_kind(), Some(FailureKind::InvalidInput));
    assert_eq!(by_email.call_count(), 0);
}
