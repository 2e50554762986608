//! Application configuration loaded from environment variables.

use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::adapters::{DirectoryAdapter, HttpJsonAdapter, WebSearchAdapter};
use crate::ai::OpenAIBackend;
use crate::error::{AggregationError, Result};
use crate::extract::build_extractor;
use crate::pipeline::{AdapterRegistry, Orchestrator};
use crate::security::SecretString;
use crate::traits::backend::EntityBackend;
use crate::types::config::{ExtractorKind, OrchestratorConfig};

/// One `id=url` entry of `AGGREGATION_HTTP_SOURCES`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSource {
    pub id: String,
    pub url: Url,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub orchestrator: OrchestratorConfig,
    pub openai_api_key: Option<SecretString>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub tavily_api_key: Option<SecretString>,
    pub http_sources: Vec<HttpSource>,
    pub directory_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut orchestrator = OrchestratorConfig::default();
        if let Some(ms) = get("AGGREGATION_DEADLINE_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                AggregationError::Config("AGGREGATION_DEADLINE_MS must be a number".into())
            })?;
            orchestrator = orchestrator.with_deadline(Duration::from_millis(ms));
        }
        if let Some(kind) = get("AGGREGATION_EXTRACTOR") {
            let kind: ExtractorKind = kind.parse().map_err(AggregationError::Config)?;
            orchestrator = orchestrator.with_extractor(kind);
        }

        let http_sources = match get("AGGREGATION_HTTP_SOURCES") {
            Some(raw) => parse_http_sources(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            orchestrator,
            openai_api_key: get("OPENAI_API_KEY").map(SecretString::new),
            openai_model: get("OPENAI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            tavily_api_key: get("TAVILY_API_KEY").map(SecretString::new),
            http_sources,
            directory_file: get("AGGREGATION_DIRECTORY_FILE").map(PathBuf::from),
        })
    }

    /// The AI backend, when an API key is configured.
    pub fn backend(&self) -> Option<Arc<dyn EntityBackend>> {
        let key = self.openai_api_key.clone()?;
        let mut backend = OpenAIBackend::new(key);
        if let Some(model) = &self.openai_model {
            backend = backend.with_model(model.clone());
        }
        if let Some(url) = &self.openai_base_url {
            backend = backend.with_base_url(url.clone());
        }
        Some(Arc::new(backend))
    }

    /// Registry with every adapter the environment configures.
    pub fn registry(&self) -> Result<AdapterRegistry> {
        let mut registry = AdapterRegistry::new();

        if let Some(path) = &self.directory_file {
            registry.register(Arc::new(DirectoryAdapter::from_json_file("directory", path)?))?;
        }
        for source in &self.http_sources {
            registry.register(Arc::new(HttpJsonAdapter::new(
                source.id.as_str(),
                source.url.clone(),
            )))?;
        }
        if let Some(key) = &self.tavily_api_key {
            registry.register(Arc::new(WebSearchAdapter::new(key.clone())))?;
        }

        if registry.is_empty() {
            warn!("No sources configured; runs will only echo the query");
        }
        Ok(registry)
    }

    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let extractor = build_extractor(&self.orchestrator, self.backend());
        Ok(Orchestrator::new(
            self.registry()?,
            extractor,
            self.orchestrator.clone(),
        ))
    }
}

/// Parse `id=url,id=url`.
pub fn parse_http_sources(raw: &str) -> Result<Vec<HttpSource>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, url) = entry.split_once('=').ok_or_else(|| {
                AggregationError::Config(format!("expected id=url, got {:?}", entry))
            })?;
            let url = Url::parse(url.trim())
                .map_err(|e| AggregationError::Config(format!("bad url for {}: {}", id, e)))?;
            Ok(HttpSource {
                id: id.trim().to_string(),
                url,
            })
        })
        .collect()
}
