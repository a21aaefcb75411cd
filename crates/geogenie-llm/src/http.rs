//! Error mapping shared by the HTTP adapters

use geogenie_core::config::SessionConfig;
use geogenie_core::error::TransportError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

const BODY_SNIPPET: usize = 300;

/// Key required by a hosted provider, or an auth error before any request is made
pub(crate) fn require_api_key<'a>(provider: &str, session: &'a SessionConfig) -> Result<&'a str, TransportError> {
    session
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| TransportError::AuthError {
            provider: provider.to_string(),
            detail: "no API key configured".to_string(),
        })
}

pub(crate) fn network_error(provider: &str, session: &SessionConfig, err: reqwest::Error) -> TransportError {
    let detail = if err.is_timeout() {
        format!("request timed out after {}s", session.timeout.as_secs())
    } else if err.is_connect() {
        format!("could not connect to {}: {}", session.base_url, err)
    } else {
        err.to_string()
    };
    TransportError::NetworkError { provider: provider.to_string(), detail }
}

pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> TransportError {
    let snippet: String = body.chars().take(BODY_SNIPPET).collect();
    let detail = format!("HTTP {}: {}", status, snippet.trim());
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        TransportError::AuthError { provider: provider.to_string(), detail }
    } else {
        TransportError::NetworkError { provider: provider.to_string(), detail }
    }
}

/// Check the status and decode the JSON body of a response
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    session: &SessionConfig,
    response: reqwest::Response,
) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| network_error(provider, session, e))?;

    if !status.is_success() {
        return Err(status_error(provider, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| TransportError::NetworkError {
        provider: provider.to_string(),
        detail: format!("unexpected response body: {}", e),
    })
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses_map_to_auth_error() {
        let err = status_error("openai", StatusCode::UNAUTHORIZED, "{\"error\":\"bad key\"}");
        assert!(matches!(err, TransportError::AuthError { .. }));

        let err = status_error("anthropic", StatusCode::FORBIDDEN, "");
        assert!(matches!(err, TransportError::AuthError { .. }));

        let err = status_error("openai", StatusCode::TOO_MANY_REQUESTS, "slow down");
        match err {
            TransportError::NetworkError { detail, .. } => assert!(detail.contains("429")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let session = SessionConfig::default();
        assert!(matches!(require_api_key("openai", &session), Err(TransportError::AuthError { .. })));

        let session = SessionConfig::default().with_api_key("  ");
        assert!(require_api_key("openai", &session).is_err());

        let session = SessionConfig::default().with_api_key("sk-1");
        assert_eq!(require_api_key("openai", &session).unwrap(), "sk-1");
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(endpoint("https://api.openai.com/v1/", "/chat/completions"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(endpoint("http://localhost:11434", "api/chat"), "http://localhost:11434/api/chat");
    }
}
