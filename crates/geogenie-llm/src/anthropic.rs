use async_trait::async_trait;
use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use geogenie_core::models::Prompt;
use serde::{Deserialize, Serialize};

use crate::http::{endpoint, network_error, read_json, require_api_key};
use crate::ports::LlmBackend;

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Anthropic messages API adapter
pub struct AnthropicBackend {
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for AnthropicBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn send(&self, prompt: &Prompt, session: &SessionConfig) -> Result<String, TransportError> {
        let api_key = require_api_key(PROVIDER, session)?;
        let request = MessagesRequest::from_prompt(prompt, session);

        tracing::debug!(model = %session.model, prompt_chars = prompt.len(), "Sending prompt to Anthropic");

        let response = self
            .client
            .post(endpoint(&session.base_url, "messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(session.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, session, e))?;

        let body: MessagesResponse = read_json(PROVIDER, session, response).await?;
        Ok(body.into_text())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Request body for the messages API
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

impl<'a> MessagesRequest<'a> {
    fn from_prompt(prompt: &'a Prompt, session: &'a SessionConfig) -> Self {
        Self {
            model: &session.model,
            system: &prompt.system,
            messages: [UserMessage { role: "user", content: &prompt.user }],
            max_tokens: session.max_tokens,
            temperature: session.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the messages API
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Concatenate the text blocks
    fn into_text(self) -> String {
        self.content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogenie_core::models::Provider;
    use serde_json::json;

    #[test]
    fn test_request_body_puts_system_at_top_level() {
        let prompt = Prompt { system: "rules".to_string(), user: "clip roads".to_string() };
        let session = SessionConfig::for_provider(Provider::Anthropic);
        let body = serde_json::to_value(MessagesRequest::from_prompt(&prompt, &session)).unwrap();

        assert_eq!(body["system"], "rules");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "clip roads"}]));
        assert_eq!(body["model"], Provider::Anthropic.default_model());
    }

    #[test]
    fn test_response_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "{\"operation\":"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "\"dissolve\"}"}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_text(), "{\"operation\":\"dissolve\"}");
    }
}
