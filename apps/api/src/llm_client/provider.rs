//! Provider configuration: which backend is active and what it can do.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Hosts known to honor `response_format: {"type": "json_object"}`.
const JSON_MODE_HOSTS: &[&str] = &["openai.com", "groq.com"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "OPENAI")]
    OpenAi,
    #[serde(rename = "OPENROUTER")]
    OpenRouter,
    Groq,
    Gemini,
    Ollama,
    Custom,
}

/// The two request/response shapes spoken by supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// OpenAI-compatible `POST /chat/completions`.
    ChatCompletions,
    /// Gemini `POST /models/{model}:generateContent`.
    GenerateContent,
}

impl ProviderKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi | ProviderKind::Custom => "https://api.openai.com/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn wire_format(self) -> WireFormat {
        match self {
            ProviderKind::Gemini => WireFormat::GenerateContent,
            _ => WireFormat::ChatCompletions,
        }
    }

    /// Local inference: no auth header, no image input.
    pub fn is_local(self) -> bool {
        matches!(self, ProviderKind::Ollama)
    }

    /// Aggregators expect attribution headers alongside the bearer token.
    pub fn is_aggregator(self) -> bool {
        matches!(self, ProviderKind::OpenRouter)
    }
}

/// The single active provider configuration.
///
/// Created with defaults, edited through the settings API, persisted by the store
/// and re-read at the start of every audit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    /// May be empty for local inference.
    #[serde(default)]
    pub api_key: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            api_key: String::new(),
            model_name: "gpt-4o-mini".to_string(),
            base_url: Some(ProviderKind::OpenAi.default_base_url().to_string()),
        }
    }
}

impl ProviderConfig {
    /// Configured base URL without a trailing slash, or the provider default.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn supports_vision(&self) -> bool {
        !self.provider.is_local()
    }

    /// Best-effort: matched on the endpoint host, not on the provider tag.
    pub fn supports_json_mode(&self) -> bool {
        let Ok(url) = Url::parse(&self.resolved_base_url()) else {
            return false;
        };
        url.host_str()
            .map(|host| JSON_MODE_HOSTS.iter().any(|allowed| host.ends_with(allowed)))
            .unwrap_or(false)
    }

    /// Copy safe to hand back to clients: all but the last four key characters masked.
    pub fn redacted(&self) -> Self {
        let visible: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let api_key = if self.api_key.chars().count() > 4 {
            format!("****{visible}")
        } else if self.api_key.is_empty() {
            String::new()
        } else {
            "****".to_string()
        };
        Self {
            api_key,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: ProviderKind, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: "sk-test-1234".to_string(),
            model_name: "m".to_string(),
            base_url: base_url.map(str::to_string),
        }
    }

    #[test]
    fn test_provider_kind_serde_uses_uppercase_tags() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            r#""OPENAI""#
        );
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenRouter).unwrap(),
            r#""OPENROUTER""#
        );
        let kind: ProviderKind = serde_json::from_str(r#""OLLAMA""#).unwrap();
        assert_eq!(kind, ProviderKind::Ollama);
    }

    #[test]
    fn test_config_deserializes_camel_case_without_base_url() {
        let json = r#"{"provider":"GROQ","apiKey":"k","modelName":"llama3"}"#;
        let cfg: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Groq);
        assert_eq!(cfg.base_url, None);
        assert_eq!(cfg.resolved_base_url(), "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_resolved_base_url_trims_trailing_slash_and_ignores_blank() {
        let cfg = config(ProviderKind::Custom, Some("http://my-host:9000/v1/"));
        assert_eq!(cfg.resolved_base_url(), "http://my-host:9000/v1");

        let blank = config(ProviderKind::Ollama, Some("   "));
        assert_eq!(blank.resolved_base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_json_mode_allow_list_matches_host() {
        assert!(config(ProviderKind::OpenAi, None).supports_json_mode());
        assert!(config(ProviderKind::Groq, None).supports_json_mode());
        assert!(!config(ProviderKind::OpenRouter, None).supports_json_mode());
        assert!(!config(ProviderKind::Ollama, None).supports_json_mode());
        // Path segments do not count, only the host does.
        assert!(!config(ProviderKind::Custom, Some("http://proxy.local/openai.com")).supports_json_mode());
    }

    #[test]
    fn test_only_local_provider_lacks_vision() {
        assert!(!config(ProviderKind::Ollama, None).supports_vision());
        assert!(config(ProviderKind::Gemini, None).supports_vision());
        assert!(config(ProviderKind::Custom, None).supports_vision());
    }

    #[test]
    fn test_wire_format_is_gemini_only_for_gemini() {
        assert_eq!(ProviderKind::Gemini.wire_format(), WireFormat::GenerateContent);
        assert_eq!(ProviderKind::OpenRouter.wire_format(), WireFormat::ChatCompletions);
    }

    #[test]
    fn test_redacted_masks_key() {
        let cfg = config(ProviderKind::OpenAi, None);
        assert_eq!(cfg.redacted().api_key, "****1234");
        let empty = ProviderConfig::default();
        assert_eq!(empty.redacted().api_key, "");
    }
}
