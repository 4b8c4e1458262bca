// Rate-limited relay for users without their own key.
// Callers send {model, payload}; the server adds its Gemini key and forwards the payload
// untouched. The upstream host is fixed by configuration, never by the caller.

pub mod handlers;
pub mod limiter;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Server Config Error: Missing GEMINI_API_KEY env var.")]
    MissingKey,

    #[error("Provider Error: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct GeminiRelay {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiRelay {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Forwards `payload` to `generateContent` for `model` and returns the upstream JSON.
    pub async fn forward(&self, model: &str, payload: &Value) -> Result<Value, RelayError> {
        let key = self.api_key.as_deref().ok_or(RelayError::MissingKey)?;

        debug!("Relaying request for model {model}");
        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .query(&[("key", key)])
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(RelayError::Upstream { status, body });
        }
        Ok(response.json().await?)
    }
}

/// Model ids end up in the upstream path, so only plain id characters are accepted.
pub fn is_valid_model(model: &str) -> bool {
    !model.is_empty()
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
