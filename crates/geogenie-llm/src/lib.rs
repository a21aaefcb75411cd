//! GeoGenie LLM - Language-model port and HTTP adapters
//!
//! This crate defines the port the intent resolver talks through, along with
//! adapters for the OpenAI, Anthropic and Ollama chat APIs.

pub mod anthropic;
pub mod factory;
mod http;
pub mod ollama;
pub mod openai;
pub mod ports;

// Re-export main types
pub use anthropic::AnthropicBackend;
pub use factory::build_backend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use ports::LlmBackend;
