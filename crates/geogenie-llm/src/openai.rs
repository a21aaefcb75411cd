use async_trait::async_trait;
use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use geogenie_core::models::Prompt;
use serde::{Deserialize, Serialize};

use crate::http::{endpoint, network_error, read_json, require_api_key};
use crate::ports::LlmBackend;

const PROVIDER: &str = "openai";

/// OpenAI chat completions adapter
///
/// Also works with any server exposing the same API through `base_url`.
pub struct OpenAiBackend {
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for OpenAiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn send(&self, prompt: &Prompt, session: &SessionConfig) -> Result<String, TransportError> {
        let api_key = require_api_key(PROVIDER, session)?;
        let request = ChatRequest::from_prompt(prompt, session);

        tracing::debug!(model = %session.model, prompt_chars = prompt.len(), "Sending prompt to OpenAI");

        let response = self
            .client
            .post(endpoint(&session.base_url, "chat/completions"))
            .bearer_auth(api_key)
            .timeout(session.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, session, e))?;

        let body: ChatResponse = read_json(PROVIDER, session, response).await?;
        Ok(body.into_text())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Request body for the chat completions API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    fn from_prompt(prompt: &'a Prompt, session: &'a SessionConfig) -> Self {
        Self {
            model: &session.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            temperature: session.temperature,
            max_tokens: session.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}
