//! Adapter tests against a local one-shot HTTP responder

use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use geogenie_core::models::{Prompt, Provider};
use geogenie_llm::{AnthropicBackend, LlmBackend, OllamaBackend, OpenAiBackend};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve a single canned response and hand back the raw request text
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        // read headers, then as much body as Content-Length announces
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (base_url, handle)
}

fn prompt() -> Prompt {
    Prompt { system: "system rules".to_string(), user: "buffer the schools layer by 100 meters".to_string() }
}

fn session(provider: Provider, base_url: String) -> SessionConfig {
    SessionConfig { base_url, timeout: Duration::from_secs(5), ..SessionConfig::for_provider(provider) }
        .with_api_key("test-key")
}

#[tokio::test]
async fn test_openai_round_trip() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"{\"operation\":\"buffer\"}"}}]}"#,
    )
    .await;

    let text = OpenAiBackend::new().send(&prompt(), &session(Provider::OpenAi, base_url)).await.unwrap();
    assert_eq!(text, r#"{"operation":"buffer"}"#);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat/completions"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(request.contains("buffer the schools layer by 100 meters"));
}

#[tokio::test]
async fn test_openai_unauthorized_is_auth_error() {
    let (base_url, server) = serve_once("401 Unauthorized", r#"{"error":{"message":"Incorrect API key"}}"#).await;

    let err = OpenAiBackend::new().send(&prompt(), &session(Provider::OpenAi, base_url)).await.unwrap_err();
    match err {
        TransportError::AuthError { provider, detail } => {
            assert_eq!(provider, "openai");
            assert!(detail.contains("401"));
        }
        other => panic!("expected auth error, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_anthropic_sends_version_header() {
    let (base_url, server) =
        serve_once("200 OK", r#"{"content":[{"type":"text","text":"{\"operation\":null}"}]}"#).await;

    let text = AnthropicBackend::new()
        .send(&prompt(), &session(Provider::Anthropic, base_url))
        .await
        .unwrap();
    assert_eq!(text, r#"{"operation":null}"#);

    let request = server.await.unwrap().to_ascii_lowercase();
    assert!(request.starts_with("post /messages"));
    assert!(request.contains("x-api-key: test-key"));
    assert!(request.contains("anthropic-version: 2023-06-01"));
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let (base_url, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

    let err = OllamaBackend::new().send(&prompt(), &session(Provider::Ollama, base_url)).await.unwrap_err();
    assert!(matches!(err, TransportError::NetworkError { .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // bind then drop so the port is very likely closed
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = OllamaBackend::new().send(&prompt(), &session(Provider::Ollama, base_url)).await.unwrap_err();
    assert!(matches!(err, TransportError::NetworkError { .. }));
}
