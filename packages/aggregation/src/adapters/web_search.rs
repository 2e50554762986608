//! Web search adapter (Tavily).
//!
//! Search results are free text; the orchestrator runs them through the
//! configured entity extractor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::adapters::http_json::check_status;
use crate::error::{AdapterError, AdapterResult};
use crate::security::{env_secret, SecretString};
use crate::traits::adapter::{FieldRequirement, SourceAdapter};
use crate::types::payload::PayloadData;
use crate::types::profile::SourceId;
use crate::types::query::{Query, QueryField};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Serialize)]
struct Request {
    query: String,
    search_depth: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    title: Option<String>,
    content: Option<String>,
}

/// Tavily-backed web search adapter.
pub struct WebSearchAdapter {
    id: SourceId,
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
    timeout: Option<Duration>,
}

impl WebSearchAdapter {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            id: SourceId::new("web_search"),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results: 5,
            timeout: None,
        }
    }

    /// Create from `TAVILY_API_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        env_secret("TAVILY_API_KEY").map(Self::new)
    }

    pub fn with_id(mut self, id: impl Into<SourceId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Point at a Tavily-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Search string for a query: quoted name first, then the other identifiers.
pub fn search_terms(query: &Query) -> String {
    let mut terms = Vec::new();
    if let Some(name) = query.get(QueryField::Name) {
        terms.push(format!("\"{}\"", name));
    }
    for field in [
        QueryField::Location,
        QueryField::Email,
        QueryField::Username,
        QueryField::Phone,
    ] {
        if let Some(value) = query.get(field) {
            terms.push(value.to_string());
        }
    }
    terms.join(" ")
}

/// Flatten results into one text block, one paragraph per hit.
fn render(results: &[TavilyResult]) -> String {
    results
        .iter()
        .map(|r| {
            let mut paragraph = String::new();
            if let Some(title) = r.title.as_deref().filter(|t| !t.trim().is_empty()) {
                paragraph.push_str(title.trim());
                paragraph.push('\n');
            }
            if let Some(content) = r.content.as_deref() {
                paragraph.push_str(content.trim());
                paragraph.push('\n');
            }
            paragraph.push_str(&r.url);
            paragraph
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl SourceAdapter for WebSearchAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn requirement(&self) -> FieldRequirement {
        FieldRequirement::any_of([QueryField::Name, QueryField::Email, QueryField::Username])
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch(&self, query: &Query) -> AdapterResult<PayloadData> {
        let request = Request {
            query: search_terms(query),
            search_depth: "basic".to_string(),
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", self.api_key.bearer())
            .json(&request)
            .send()
            .await?;

        check_status(response.status())?;

        let tavily_response: Response = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        debug!(
            source = %self.id,
            results = tavily_response.results.len(),
            "Web search complete"
        );

        if tavily_response.results.is_empty() {
            return Err(AdapterError::NoMatch);
        }
        Ok(PayloadData::Text(render(&tavily_response.results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PatternExtractor;
    use crate::types::profile::ProfileField;

    #[test]
    fn test_search_terms() {
        let query = Query::new()
            .with_name("Jane Doe")
            .with_location("Seattle")
            .with_username("@jdoe");
        assert_eq!(search_terms(&query), "\"Jane Doe\" Seattle @jdoe");
    }

    #[test]
    fn test_render() {
        let results = vec![
            TavilyResult {
                url: "https://example.com/jane".into(),
                title: Some("Jane Doe - Example".into()),
                content: Some("Jane Doe, 29, Seattle".into()),
            },
            TavilyResult {
                url: "https://example.org/b".into(),
                title: None,
                content: None,
            },
        ];

        assert_eq!(
            render(&results),
            "Jane Doe - Example\nJane Doe, 29, Seattle\nhttps://example.com/jane\n\nhttps://example.org/b"
        );
    }

    #[test]
    fn test_rendered_hits_yield_profiles() {
        let results = vec![
            TavilyResult {
                url: "https://www.linkedin.com/in/jane-doe".into(),
                title: Some("Jane Doe - Software Engineer - LinkedIn".into()),
                content: Some("Seattle, Washington. 500+ connections.".into()),
            },
            TavilyResult {
                url: "https://news.example.com/2024/local-hero".into(),
                title: Some("Local hero honored".into()),
                content: Some("Jane Doe was honored on Tuesday.".into()),
            },
        ];

        let entities = PatternExtractor::default().extract_entities(&render(&results));
        let profiles: Vec<String> = entities
            .iter()
            .filter(|e| e.field == ProfileField::Profiles)
            .map(|e| e.value.to_string())
            .collect();

        assert_eq!(profiles, vec!["https://www.linkedin.com/in/jane-doe"]);
    }

    #[test]
    fn test_requirement() {
        let adapter = WebSearchAdapter::new("tvly-test");
        assert!(!adapter
            .requirement()
            .is_satisfied_by(&Query::new().with_phone("206-555-0100")));
        assert_eq!(adapter.id().as_str(), "web_search");
    }
}
