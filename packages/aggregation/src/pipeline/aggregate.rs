//! The aggregate result handed back to callers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::correlate::CorrelatedProfile;
use crate::pipeline::orchestrator::RunOutcome;
use crate::types::payload::SourcePayload;
use crate::types::profile::SourceId;
use crate::types::query::Query;
use crate::types::report::RunReport;

/// Output of one aggregation run.
///
/// Raw payloads are kept alongside the profile so every value can be traced
/// back to what a source actually said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub search_id: Uuid,
    pub query: Query,

    /// Raw per-source payloads, in completion order.
    pub sources: IndexMap<SourceId, SourcePayload>,

    pub profile: CorrelatedProfile,
    pub report: RunReport,
}

impl AggregateResult {
    pub fn new(query: Query, outcome: RunOutcome, profile: CorrelatedProfile) -> Self {
        Self {
            search_id: Uuid::now_v7(),
            query,
            sources: outcome.payloads,
            profile,
            report: outcome.report,
        }
    }

    /// Whether at least one source answered with data.
    pub fn has_data(&self) -> bool {
        self.report.succeeded() > 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::correlate::{Correlator, FieldAssertion};
    use crate::types::payload::PayloadData;
    use crate::types::profile::{FieldValue, ProfileField};

    #[test]
    fn test_json_shape() {
        let mut sources = IndexMap::new();
        sources.insert(SourceId::from("dir"), SourcePayload::success(PayloadData::Empty));
        let outcome = RunOutcome {
            payloads: sources,
            assertions: Vec::new(),
            report: RunReport::start("abc", 1000),
        };
        let profile = Correlator::new().correlate(&[FieldAssertion::new(
            ProfileField::Name,
            FieldValue::text("Jane Doe"),
            "dir",
            0.9,
        )]);

        let result = AggregateResult::new(Query::new().with_name("Jane Doe"), outcome, profile);
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["sources"]["dir"]["outcome"], "success");
        assert_eq!(json["sources"]["dir"]["data"]["type"], "empty");
        assert_eq!(json["profile"]["fields"]["name"]["value"], "Jane Doe");
        assert_eq!(json["profile"]["fields"]["name"]["contributing_sources"][0], "dir");
        assert_eq!(json["report"]["fingerprint"], "abc");
        assert!(!result.has_data());
    }
}
