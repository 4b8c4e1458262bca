//! Request Builder: turns a prompt plus resume documents into a provider-specific envelope.
//!
//! Two variant builders sit behind `build_request`, selected by the provider's wire format.
//! Neither performs I/O: attachments are already in memory by the time they arrive here.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::llm_client::provider::{ProviderConfig, WireFormat};

pub const TEMPERATURE: f32 = 0.5;
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// An uploaded resume file, already validated and read into memory.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl FileAttachment {
    /// `data:<mime>;base64,<payload>`, the shape browsers produce for inline images.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

/// Where resume content comes from. At most one source per document.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    Text(String),
    File(FileAttachment),
}

#[derive(Debug, Clone)]
pub enum Document {
    /// The single resume under audit.
    Resume(ResumeSource),
    /// One named candidate in a multi-candidate comparison.
    Candidate { name: String, source: ResumeSource },
}

impl Document {
    pub fn resume(source: ResumeSource) -> Self {
        Document::Resume(source)
    }

    pub fn candidate(name: impl Into<String>, source: ResumeSource) -> Self {
        Document::Candidate {
            name: name.into(),
            source,
        }
    }
}

/// Everything the builder needs besides the provider configuration.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub system: &'a str,
    pub user: String,
    pub documents: Vec<Document>,
    pub schema: &'a Value,
}

/// The materialized payload. Built per call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEnvelope {
    ChatCompletions(ChatRequest),
    GenerateContent {
        model: String,
        body: GenerateContentRequest,
    },
}

/// OpenAI-compatible `/chat/completions` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: ChatContent,
}

/// Plain text, or typed parts once an image is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ChatPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Gemini `models/{model}:generateContent` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    pub system_instruction: GeminiContent,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeminiPart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
}

#[cfg(test)]
impl RequestEnvelope {
    /// The body as it goes on the wire.
    pub fn body(&self) -> Value {
        match self {
            RequestEnvelope::ChatCompletions(body) => serde_json::to_value(body),
            RequestEnvelope::GenerateContent { body, .. } => serde_json::to_value(body),
        }
        .unwrap()
    }
}

/// Provider-neutral user message content, in order.
#[derive(Debug, Clone, PartialEq)]
enum Part {
    Text(String),
    Inline { data_url: String },
}

pub fn build_request(config: &ProviderConfig, prompt: &PromptRequest<'_>) -> RequestEnvelope {
    let system = system_with_schema(prompt.system, prompt.schema);
    let parts = user_parts(config, prompt);

    match config.provider.wire_format() {
        WireFormat::ChatCompletions => chat_completions(config, &system, &parts),
        WireFormat::GenerateContent => generate_content(config, &system, &parts),
    }
}

/// The schema is a steering hint only; nothing downstream enforces it.
fn system_with_schema(system: &str, schema: &Value) -> String {
    format!("{system}\nOUTPUT JSON SCHEMA:\n{schema}")
}

fn user_parts(config: &ProviderConfig, prompt: &PromptRequest<'_>) -> Vec<Part> {
    let mut leading = Vec::new();
    let mut trailing = Vec::new();
    let mut inline = Vec::new();

    for document in &prompt.documents {
        match (document, config.supports_vision()) {
            (Document::Resume(ResumeSource::Text(text)), _) => {
                leading.push(format!("<resume_content>\n{text}\n</resume_content>"));
            }
            (Document::Resume(ResumeSource::File(file)), false) => {
                leading.push(file_placeholder(&file.name));
            }
            (Document::Candidate { name, source: ResumeSource::Text(text) }, _) => {
                trailing.push(format!("Candidate {name}: {text}"));
            }
            (Document::Candidate { name, source: ResumeSource::File(_) }, false) => {
                trailing.push(format!(
                    "Candidate {name}: [File uploaded - please use text input for local models]"
                ));
            }
            (
                Document::Resume(ResumeSource::File(file))
                | Document::Candidate { source: ResumeSource::File(file), .. },
                true,
            ) => {
                inline.push(Part::Inline {
                    data_url: file.data_url(),
                });
            }
        }
    }

    let mut text_blocks = leading;
    text_blocks.push(prompt.user.clone());
    text_blocks.extend(trailing);

    let mut parts = vec![Part::Text(text_blocks.join("\n\n"))];
    parts.extend(inline);
    parts
}

fn file_placeholder(file_name: &str) -> String {
    format!(
        "[Note: A file \"{file_name}\" was uploaded but this model doesn't support image input. \
         Please paste the text content instead.]"
    )
}

fn chat_completions(config: &ProviderConfig, system: &str, parts: &[Part]) -> RequestEnvelope {
    let has_inline = parts.iter().any(|p| matches!(p, Part::Inline { .. }));

    let user_content = if has_inline {
        ChatContent::Parts(
            parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => ChatPart::Text { text: text.clone() },
                    Part::Inline { data_url } => ChatPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url.clone(),
                        },
                    },
                })
                .collect(),
        )
    } else {
        ChatContent::Text(joined_text(parts))
    };

    RequestEnvelope::ChatCompletions(ChatRequest {
        model: config.model_name.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: ChatContent::Text(system.to_string()),
            },
            ChatMessage {
                role: "user",
                content: user_content,
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
        response_format: config
            .supports_json_mode()
            .then_some(ResponseFormat { kind: "json_object" }),
    })
}

fn generate_content(config: &ProviderConfig, system: &str, parts: &[Part]) -> RequestEnvelope {
    let wire_parts = parts
        .iter()
        .filter_map(|part| match part {
            Part::Text(text) => Some(GeminiPart::Text(text.clone())),
            Part::Inline { data_url } => split_data_url(data_url).map(|(mime_type, data)| {
                GeminiPart::InlineData(InlineData {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                })
            }),
        })
        .collect();

    RequestEnvelope::GenerateContent {
        model: config.model_name.clone(),
        body: GenerateContentRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: wire_parts,
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text(system.to_string())],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json",
            },
        },
    }
}

fn joined_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            Part::Text(text) => Some(text.as_str()),
            Part::Inline { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits `data:<mime>;base64,<payload>` into `(mime, payload)`.
pub fn split_data_url(data_url: &str) -> Option<(&str, &str)> {
    let rest = data_url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64").unwrap_or(meta);
    Some((mime, payload))
}
