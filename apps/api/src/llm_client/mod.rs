//! LLM Client: the single point of entry for all provider calls in CareerFry.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! All audit traffic goes through `LlmClient::complete`; the rate-limited proxy
//! is the only exception and never reaches a user-configured provider.
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
pub mod provider;
pub mod request;

use provider::{ProviderConfig, ProviderKind};
use request::RequestEnvelope;

/// Upper bound on provider error bodies echoed back to the user.
const MAX_ERROR_BODY_CHARS: usize = 500;
const ATTRIBUTION_TITLE: &str = "Resume Auditor";
/// Returned in place of missing content; some providers send empty completions on refusal.
pub const EMPTY_COMPLETION: &str = "{}";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("INVALID API KEY. Please check your configuration in Settings.")]
    Auth,

    #[error("MODEL NOT FOUND: \"{model}\" doesn't exist on this provider. Check model name in Settings.")]
    ModelNotFound { model: String },

    #[error("RATE LIMIT EXCEEDED. You are sending too many requests too quickly.")]
    RateLimited,

    #[error("INSUFFICIENT BALANCE. Your API key has run out of credits.")]
    QuotaExceeded,

    #[error("CONNECTION FAILED. Is Ollama running? Start it with: ollama serve")]
    LocalEngineUnreachable,

    #[error("API ERROR ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("MALFORMED RESPONSE: {0}")]
    MalformedResponse(String),

    #[error("AI returned malformed JSON that could not be repaired. Try a different model or simplify your request.")]
    Unparseable,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LlmError {
    /// Uppercase category shown to the user and returned in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::Auth => "AUTH_ERROR",
            LlmError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            LlmError::RateLimited => "RATE_LIMITED",
            LlmError::QuotaExceeded => "QUOTA_EXCEEDED",
            LlmError::LocalEngineUnreachable => "LOCAL_ENGINE_UNREACHABLE",
            LlmError::Provider { .. } | LlmError::Http(_) => "GENERIC_PROVIDER_ERROR",
            LlmError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            LlmError::Unparseable => "UNPARSEABLE_OUTPUT",
        }
    }
}

/// Raw model text plus the truncation signal. Downstream repair handles the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Provider stopped on its max-token bound; the JSON is likely incomplete.
    pub truncated: bool,
}

/// The single provider client used by all audit actions.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    app_url: String,
}

impl LlmClient {
    /// `app_url` is sent as the referer to aggregator providers.
    pub fn new(app_url: String) -> Self {
        // No timeout: an abandoned request is simply dropped with its caller.
        Self {
            client: Client::new(),
            app_url,
        }
    }

    /// Sends one envelope to the configured provider and extracts the raw text.
    pub async fn complete(
        &self,
        config: &ProviderConfig,
        envelope: &RequestEnvelope,
    ) -> Result<Completion, LlmError> {
        let base_url = config.resolved_base_url();

        let request = match envelope {
            RequestEnvelope::ChatCompletions(body) => self
                .client
                .post(format!("{base_url}/chat/completions"))
                .json(body),
            RequestEnvelope::GenerateContent { model, body } => self
                .client
                .post(format!("{base_url}/models/{model}:generateContent"))
                .query(&[("key", config.api_key.as_str())])
                .json(body),
        };
        let request = self.with_headers(request, config);

        debug!(
            "Calling {:?} model {} at {}",
            config.provider, config.model_name, base_url
        );

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_connect() && config.provider.is_local() => {
                warn!("Local inference engine unreachable at {base_url}: {e}");
                return Err(LlmError::LocalEngineUnreachable);
            }
            Err(e) => return Err(LlmError::Http(e)),
        };

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Provider returned {status}: {}", truncate_chars(&body, 200));
            return Err(classify_failure(status, &body, &config.model_name));
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            LlmError::MalformedResponse(format!("response body is not JSON ({e})"))
        })?;

        let completion = match envelope {
            RequestEnvelope::ChatCompletions(_) => extract_chat_completion(&parsed)?,
            RequestEnvelope::GenerateContent { .. } => extract_gemini_completion(&parsed)?,
        };

        if completion.truncated {
            warn!(
                "Model {} hit its output token limit; response will need repair",
                config.model_name
            );
        }
        debug!("Provider call succeeded: {} chars", completion.text.len());

        Ok(completion)
    }

    fn with_headers(&self, request: RequestBuilder, config: &ProviderConfig) -> RequestBuilder {
        let mut request = request.header("content-type", "application/json");

        let bearer = config.provider != ProviderKind::Gemini
            && !config.provider.is_local()
            && !config.api_key.is_empty();
        if bearer {
            request = request.bearer_auth(&config.api_key);
        }

        if config.provider.is_aggregator() {
            request = request
                .header("HTTP-Referer", &self.app_url)
                .header("X-Title", ATTRIBUTION_TITLE);
        }

        request
    }
}

/// Maps a non-2xx provider response to a user-facing error category.
pub fn classify_failure(status: StatusCode, body: &str, model: &str) -> LlmError {
    let invalid_key = body.contains("invalid_api_key") || body.contains("API_KEY_INVALID");

    if status == StatusCode::UNAUTHORIZED || invalid_key {
        LlmError::Auth
    } else if status == StatusCode::NOT_FOUND {
        LlmError::ModelNotFound {
            model: model.to_string(),
        }
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited
    } else if status == StatusCode::PAYMENT_REQUIRED || body.contains("insufficient_quota") {
        LlmError::QuotaExceeded
    } else if body.contains("ECONNREFUSED") {
        LlmError::LocalEngineUnreachable
    } else {
        LlmError::Provider {
            status: status.as_u16(),
            body: truncate_chars(body, MAX_ERROR_BODY_CHARS),
        }
    }
}

/// `choices[0].message.content` from an OpenAI-compatible response.
fn extract_chat_completion(body: &Value) -> Result<Completion, LlmError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))?;

    let text = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(EMPTY_COMPLETION);

    let truncated = choice.get("finish_reason").and_then(Value::as_str) == Some("length");

    Ok(Completion {
        text: text.to_string(),
        truncated,
    })
}

/// `candidates[0].content.parts[0].text` from a Gemini response.
fn extract_gemini_completion(body: &Value) -> Result<Completion, LlmError> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| LlmError::MalformedResponse("response has no candidates".to_string()))?;

    let text = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(EMPTY_COMPLETION);

    let truncated = candidate.get("finishReason").and_then(Value::as_str) == Some("MAX_TOKENS");

    Ok(Completion {
        text: text.to_string(),
        truncated,
    })
}

/// Truncates on a char boundary, appending an ellipsis when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(provider: ProviderKind, base_url: &str, api_key: &str) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: api_key.to_string(),
            model_name: "test-model".to_string(),
            base_url: Some(base_url.to_string()),
        }
    }

    fn chat_envelope() -> RequestEnvelope {
        RequestEnvelope::ChatCompletions(request::ChatRequest {
            model: "test-model".to_string(),
            messages: vec![],
            temperature: request::TEMPERATURE,
            max_tokens: request::MAX_OUTPUT_TOKENS,
            response_format: None,
        })
    }

    #[test]
    fn test_classify_failure_status_codes() {
        let cases = [
            (401, "", "AUTH_ERROR"),
            (400, r#"{"error":{"code":"invalid_api_key"}}"#, "AUTH_ERROR"),
            (404, "not found", "MODEL_NOT_FOUND"),
            (429, "slow down", "RATE_LIMITED"),
            (402, "", "QUOTA_EXCEEDED"),
            (400, r#"{"error":{"type":"insufficient_quota"}}"#, "QUOTA_EXCEEDED"),
            (502, "connect ECONNREFUSED 127.0.0.1:11434", "LOCAL_ENGINE_UNREACHABLE"),
            (500, "boom", "GENERIC_PROVIDER_ERROR"),
        ];
        for (status, body, expected) in cases {
            let err = classify_failure(StatusCode::from_u16(status).unwrap(), body, "m");
            assert_eq!(err.code(), expected, "status {status} body {body}");
        }
    }

    #[test]
    fn test_model_not_found_names_model() {
        let err = classify_failure(StatusCode::NOT_FOUND, "", "gpt-9");
        assert!(err.to_string().contains("\"gpt-9\""));
    }

    #[test]
    fn test_generic_error_body_is_truncated() {
        let body = "x".repeat(2_000);
        match classify_failure(StatusCode::INTERNAL_SERVER_ERROR, &body, "m") {
            LlmError::Provider { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS + 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_extract_chat_completion_paths() {
        let ok = json!({ "choices": [{ "message": { "content": "{\"a\":1}" }, "finish_reason": "stop" }] });
        let completion = extract_chat_completion(&ok).unwrap();
        assert_eq!(completion.text, "{\"a\":1}");
        assert!(!completion.truncated);

        let empty = json!({ "choices": [{ "message": { "content": null } }] });
        assert_eq!(extract_chat_completion(&empty).unwrap().text, EMPTY_COMPLETION);

        let cut = json!({ "choices": [{ "message": { "content": "{\"a\":" }, "finish_reason": "length" }] });
        assert!(extract_chat_completion(&cut).unwrap().truncated);

        let missing = json!({ "object": "chat.completion" });
        assert_eq!(
            extract_chat_completion(&missing).unwrap_err().code(),
            "MALFORMED_RESPONSE"
        );
    }

    #[test]
    fn test_extract_gemini_completion_paths() {
        let ok = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":1}" }] },
                "finishReason": "MAX_TOKENS"
            }]
        });
        let completion = extract_gemini_completion(&ok).unwrap();
        assert_eq!(completion.text, "{\"a\":1}");
        assert!(completion.truncated);

        let refused = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert_eq!(extract_gemini_completion(&refused).unwrap().text, EMPTY_COMPLETION);

        let missing = json!({ "promptFeedback": {} });
        assert!(matches!(
            extract_gemini_completion(&missing),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_extracts_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-live");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "{\"ok\":true}" }, "finish_reason": "stop" }]
                }));
            })
            .await;

        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::OpenAi, &server.base_url(), "sk-live");
        let completion = client.complete(&cfg, &chat_envelope()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_complete_local_provider_sends_no_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header_missing("authorization");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "" } }]
                }));
            })
            .await;

        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::Ollama, &server.base_url(), "ignored");
        let completion = client.complete(&cfg, &chat_envelope()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn test_complete_aggregator_sends_attribution_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer or-key")
                    .header("http-referer", "https://careerfry.test")
                    .header("x-title", ATTRIBUTION_TITLE);
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "{}" } }]
                }));
            })
            .await;

        let client = LlmClient::new("https://careerfry.test".to_string());
        let cfg = config(ProviderKind::OpenRouter, &server.base_url(), "or-key");
        client.complete(&cfg, &chat_envelope()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_gemini_uses_key_query_and_model_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/test-model:generateContent")
                    .query_param("key", "g-key")
                    .header_missing("authorization");
                then.status(200).json_body(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "{\"g\":1}" }] } }]
                }));
            })
            .await;

        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::Gemini, &server.base_url(), "g-key");
        let envelope = RequestEnvelope::GenerateContent {
            model: "test-model".to_string(),
            body: request::GenerateContentRequest {
                contents: vec![],
                system_instruction: request::GeminiContent {
                    role: None,
                    parts: vec![request::GeminiPart::Text("sys".to_string())],
                },
                generation_config: request::GenerationConfig {
                    temperature: request::TEMPERATURE,
                    max_output_tokens: request::MAX_OUTPUT_TOKENS,
                    response_mime_type: "application/json",
                },
            },
        };
        let completion = client.complete(&cfg, &envelope).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, "{\"g\":1}");
    }

    #[tokio::test]
    async fn test_complete_maps_http_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(404).body("model_not_found");
            })
            .await;

        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::Groq, &server.base_url(), "k");
        let err = client.complete(&cfg, &chat_envelope()).await.unwrap_err();

        assert!(matches!(err, LlmError::ModelNotFound { ref model } if model == "test-model"));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json_success_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::Custom, &server.base_url(), "k");
        let err = client.complete(&cfg, &chat_envelope()).await.unwrap_err();

        assert_eq!(err.code(), "MALFORMED_RESPONSE");
    }

    #[tokio::test]
    async fn test_complete_local_connection_refused() {
        // Port 9 (discard) is essentially never listening on test hosts.
        let client = LlmClient::new("http://localhost".to_string());
        let cfg = config(ProviderKind::Ollama, "http://127.0.0.1:9/v1", "");
        let err = client.complete(&cfg, &chat_envelope()).await.unwrap_err();

        assert_eq!(err.code(), "LOCAL_ENGINE_UNREACHABLE");
    }
}
