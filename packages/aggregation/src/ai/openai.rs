//! OpenAI implementation of the entity backend.
//!
//! Works against any OpenAI-compatible chat-completions endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use aggregation::ai::OpenAIBackend;
//!
//! let backend = OpenAIBackend::new("sk-...").with_model("gpt-4o");
//! let entities = backend.extract_entities("Jane Doe, 29, Seattle").await?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::security::{env_secret, SecretString};
use crate::traits::backend::{BackendEntity, EntityBackend};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You extract facts about people from text. \
Return JSON only. Report each fact as an entity with a field, a value and a \
strength between 0 and 1. Use the fields name, age, location and occupation. \
Only report facts stated in the text; do not guess.";

/// Response shape requested from the model.
#[derive(Debug, Deserialize, JsonSchema)]
struct EntityResponse {
    #[serde(default)]
    entities: Vec<BackendEntity>,
}

/// OpenAI-based entity backend.
#[derive(Clone)]
pub struct OpenAIBackend {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAIBackend {
    /// Create a backend with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from `OPENAI_API_KEY`, honoring `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> BackendResult<Self> {
        let api_key = env_secret("OPENAI_API_KEY")
            .ok_or_else(|| BackendError::Config("OPENAI_API_KEY not set".into()))?;

        let mut backend = Self::new(api_key);
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            backend = backend.with_model(model);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            backend = backend.with_base_url(url);
        }
        Ok(backend)
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, local servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system: &str, user: &str) -> BackendResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(0.0),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", self.api_key.bearer())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| BackendError::Malformed("No choices in OpenAI response".into()))
    }
}

impl std::fmt::Debug for OpenAIBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIBackend")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl EntityBackend for OpenAIBackend {
    async fn extract_entities(&self, text: &str) -> BackendResult<Vec<BackendEntity>> {
        let schema = serde_json::to_string(&schema_for!(EntityResponse))
            .map_err(|e| BackendError::Config(e.to_string()))?;
        let system = format!(
            "{}\n\nRespond with JSON matching this schema:\n{}",
            SYSTEM_PROMPT, schema
        );

        let response = self.chat(&system, text).await?;
        let parsed = parse_entity_response(&response)?;

        debug!(
            model = %self.model,
            entities = parsed.len(),
            "OpenAI entity extraction complete"
        );
        Ok(parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Parse the model's answer, tolerating a markdown code fence around the JSON.
fn parse_entity_response(response: &str) -> BackendResult<Vec<BackendEntity>> {
    let parsed: EntityResponse = serde_json::from_str(response)
        .or_else(|_| {
            let json_str = response
                .trim()
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim();
            serde_json::from_str(json_str)
        })
        .map_err(|e| BackendError::Malformed(format!("Failed to parse entities: {}", e)))?;

    Ok(parsed.entities)
}

// OpenAI API types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_builder() {
        let backend = OpenAIBackend::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("http://localhost:8080/v1/");

        assert_eq!(backend.model(), "gpt-4o");
        assert_eq!(backend.base_url, "http://localhost:8080/v1");
        assert!(!format!("{:?}", backend).contains("sk-test"));
    }

    #[test]
    fn test_parse_plain_json() {
        let entities = parse_entity_response(
            r#"{"entities":[{"field":"name","value":"Jane Doe","strength":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(entities, vec![BackendEntity::new("name", "Jane Doe", 0.9)]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "```json\n{\"entities\":[{\"field\":\"age\",\"value\":\"29\",\"strength\":0.8}]}\n```";
        let entities = parse_entity_response(response).unwrap();
        assert_eq!(entities[0].field, "age");
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_entity_response("I could not find anyone."),
            Err(BackendError::Malformed(_))
        ));
    }
}
