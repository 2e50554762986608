//! Generic JSON people-search API adapter.
//!
//! POSTs the query as JSON and expects `{"results": [PersonRecord, ...]}`
//! back, best match first.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::adapters::record::PersonRecord;
use crate::error::{AdapterError, AdapterResult};
use crate::security::SecretString;
use crate::traits::adapter::{FieldRequirement, SourceAdapter};
use crate::types::payload::PayloadData;
use crate::types::profile::SourceId;
use crate::types::query::{Query, QueryField};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PersonRecord>,
}

/// Adapter for an HTTP endpoint that answers with structured person records.
pub struct HttpJsonAdapter {
    id: SourceId,
    endpoint: Url,
    client: reqwest::Client,
    api_key: Option<SecretString>,
    requirement: FieldRequirement,
    strength: f32,
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpJsonAdapter {
    pub fn new(id: impl Into<SourceId>, endpoint: Url) -> Self {
        Self {
            id: id.into(),
            endpoint,
            client: reqwest::Client::new(),
            api_key: None,
            requirement: FieldRequirement::any_of([
                QueryField::Name,
                QueryField::Email,
                QueryField::Phone,
            ]),
            strength: 0.7,
            timeout: None,
            user_agent: "AggregationBot/1.0".to_string(),
        }
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, key: impl Into<SecretString>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_requirement(mut self, requirement: FieldRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Set the strength reported with every record (default 0.7).
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SourceAdapter for HttpJsonAdapter {
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
        debug!(source = %self.id, endpoint = %self.endpoint, "HTTP search starting");

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("User-Agent", &self.user_agent)
            .json(query);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key.bearer());
        }

        let response = request.send().await.map_err(|e| {
            warn!(source = %self.id, error = %e, "HTTP search failed");
            AdapterError::from(e)
        })?;

        check_status(response.status())?;

        let body = response.text().await?;
        parse_response(&body, self.strength)
    }
}

/// Map an HTTP status to the adapter error vocabulary.
pub(crate) fn check_status(status: StatusCode) -> AdapterResult<()> {
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        404 => Err(AdapterError::NoMatch),
        401 | 403 | 429 => Err(AdapterError::Blocked(format!("HTTP {}", status))),
        _ => Err(AdapterError::unreachable(format!("HTTP {}", status))),
    }
}

fn parse_response(body: &str, strength: f32) -> AdapterResult<PayloadData> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| AdapterError::Malformed(e.to_string()))?;

    let record = parsed
        .results
        .first()
        .map(|person| person.to_source_record(strength))
        .ok_or(AdapterError::NoMatch)?;

    if record.is_empty() {
        return Err(AdapterError::NoMatch);
    }
    Ok(PayloadData::Record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::ProfileField;

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(AdapterError::NoMatch)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(AdapterError::Blocked(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(AdapterError::Blocked(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(AdapterError::Unreachable { timeout: false, .. })
        ));
    }

    #[test]
    fn test_parse_first_result() {
        let body = r#"{"results":[
            {"name":"Jane Doe","age":"30-34","phones":["206-555-0100"]},
            {"name":"Jane Q. Doe"}
        ]}"#;

        let PayloadData::Record(record) = parse_response(body, 0.6).unwrap() else {
            panic!("expected record");
        };
        assert_eq!(record.strength, 0.6);
        assert_eq!(
            record.values(ProfileField::Name).next().unwrap().to_string(),
            "Jane Doe"
        );
        assert_eq!(record.values(ProfileField::Phones).count(), 1);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(matches!(
            parse_response(r#"{"results":[]}"#, 0.6),
            Err(AdapterError::NoMatch)
        ));
        assert!(matches!(
            parse_response("<html>rate limited</html>", 0.6),
            Err(AdapterError::Malformed(_))
        ));
    }

    #[test]
    fn test_builder() {
        let endpoint = Url::parse("http://localhost:9000/search").unwrap();
        let adapter = HttpJsonAdapter::new("people-api", endpoint)
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(2));

        assert_eq!(adapter.id().as_str(), "people-api");
        assert_eq!(adapter.timeout(), Some(Duration::from_secs(2)));
        assert!(adapter.requirement().is_satisfied_by(&Query::new().with_phone("555-0100")));
    }
}
