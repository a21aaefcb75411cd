use async_trait::async_trait;
use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use geogenie_core::models::Prompt;
use serde::{Deserialize, Serialize};

use crate::http::{endpoint, read_json};
use crate::ports::LlmBackend;

const PROVIDER: &str = "ollama";

/// Ollama chat adapter for locally hosted models
pub struct OllamaBackend {
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn send(&self, prompt: &Prompt, session: &SessionConfig) -> Result<String, TransportError> {
        let request = OllamaChatRequest::from_prompt(prompt, session);

        tracing::debug!(model = %session.model, prompt_chars = prompt.len(), "Sending prompt to Ollama");

        let response = self
            .client
            .post(endpoint(&session.base_url, "api/chat"))
            .timeout(session.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::NetworkError {
                provider: PROVIDER.to_string(),
                detail: format!(
                    "Failed to connect to Ollama at {}: {}. Ensure Ollama is running and run 'ollama pull {}'",
                    session.base_url, e, session.model
                ),
            })?;

        // a missing model comes back as 404 with an explanatory body
        let body: OllamaChatResponse = read_json(PROVIDER, session, response).await?;
        Ok(body.message.map(|m| m.content).unwrap_or_default())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Request body for the Ollama chat API
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: [OllamaMessage<'a>; 2],
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

impl<'a> OllamaChatRequest<'a> {
    fn from_prompt(prompt: &'a Prompt, session: &'a SessionConfig) -> Self {
        Self {
            model: &session.model,
            messages: [
                OllamaMessage { role: "system", content: &prompt.system },
                OllamaMessage { role: "user", content: &prompt.user },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: session.temperature, num_predict: session.max_tokens },
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from the Ollama chat API
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogenie_core::models::Provider;

    #[test]
    fn test_request_disables_streaming() {
        let prompt = Prompt { system: "rules".to_string(), user: "dissolve parcels".to_string() };
        let session = SessionConfig::for_provider(Provider::Ollama);
        let body = serde_json::to_value(OllamaChatRequest::from_prompt(&prompt, &session)).unwrap();

        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["num_predict"], 1000);
        assert_eq!(body["messages"][1]["content"], "dissolve parcels");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(!Provider::Ollama.requires_api_key());
        assert_eq!(OllamaBackend::new().name(), "ollama");
    }
}
