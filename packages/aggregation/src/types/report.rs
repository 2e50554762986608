//! Run metadata: what ran, what failed, how long it took.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::entity::ExtractionMethod;
use crate::types::payload::{FailureKind, PayloadData, SourcePayload};
use crate::types::profile::SourceId;

/// Settled state of one adapter in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdapterStatus {
    Success,
    NoMatch,
    Failed {
        #[serde(flatten)]
        kind: FailureKind,
    },
}

impl AdapterStatus {
    pub fn of(payload: &SourcePayload) -> Self {
        match payload {
            SourcePayload::Success {
                data: PayloadData::Empty,
                ..
            } => AdapterStatus::NoMatch,
            SourcePayload::Success { .. } => AdapterStatus::Success,
            SourcePayload::Failure { kind, .. } => AdapterStatus::Failed { kind: *kind },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AdapterStatus::Failed {
                kind: FailureKind::Unreachable { timeout: true }
            }
        )
    }
}

/// One adapter's entry in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterRun {
    pub source: SourceId,

    #[serde(flatten)]
    pub status: AdapterStatus,

    /// Failure message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Extraction path, for text payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionMethod>,

    /// Entities extracted from text payloads
    #[serde(default)]
    pub entities_extracted: usize,

    pub elapsed_ms: u64,
}

/// Metadata for one aggregation run.
///
/// Adapter entries are in completion order, not registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,

    /// Query fingerprint (see [`crate::Query::fingerprint`])
    pub fingerprint: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Run deadline in milliseconds
    pub deadline_ms: u64,

    /// True when a timeout cut off at least one adapter, either the run
    /// deadline or the adapter's own tighter timeout
    pub partial: bool,

    pub adapters: Vec<AdapterRun>,

    /// Registered adapters skipped because the query lacked their inputs
    #[serde(default)]
    pub skipped: Vec<SourceId>,
}

impl RunReport {
    /// Start a report for a run.
    pub fn start(fingerprint: impl Into<String>, deadline_ms: u64) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::now_v7(),
            fingerprint: fingerprint.into(),
            started_at: now,
            finished_at: now,
            deadline_ms,
            partial: false,
            adapters: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Append a settled adapter. Only the collector calls this.
    pub fn record(&mut self, run: AdapterRun) {
        if run.status.is_timeout() {
            self.partial = true;
        }
        self.adapters.push(run);
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn entry(&self, source: &str) -> Option<&AdapterRun> {
        self.adapters.iter().find(|a| a.source.as_str() == source)
    }

    pub fn succeeded(&self) -> usize {
        self.adapters
            .iter()
            .filter(|a| a.status == AdapterStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.adapters
            .iter()
            .filter(|a| matches!(a.status, AdapterStatus::Failed { .. }))
            .count()
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
