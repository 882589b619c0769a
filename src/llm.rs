use crate::types::{NewsroomError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A single chat exchange: system instructions plus one user message.
/// Collaborators that need structured output embed the schema in the
/// system prompt and parse the reply with [`StructuredResponse`].
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Seam for the generation/evaluation/selection collaborators. Production
/// uses [`OpenAiChatClient`]; tests script a mock.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Client for any OpenAI-compatible chat-completions endpoint
/// (vLLM, OpenAI, a local proxy).
pub struct OpenAiChatClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsroom/0.1")
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = WireRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: 2048,
        };

        let url = format!("{}/chat/completions", self.api_base);
        debug!("Chat completion request to {} (model {})", url, self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NewsroomError::Llm(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: WireResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NewsroomError::Llm("Empty choices in chat response".to_string()))?;

        Ok(content)
    }
}

/// Outcome of parsing a collaborator reply into an expected shape.
/// Parse failures are data, not errors: callers apply their documented
/// fallback on `Malformed` instead of propagating anything.
#[derive(Debug)]
pub enum StructuredResponse<T> {
    Parsed(T),
    Malformed(String),
}

impl<T: DeserializeOwned> StructuredResponse<T> {
    /// Parse a model reply that should contain a JSON object. Tries the raw
    /// text first, then a fenced ```json block, then the outermost `{...}`
    /// span. Models wrap JSON in prose often enough that all three paths
    /// see real traffic.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(value) = serde_json::from_str::<T>(trimmed) {
            return StructuredResponse::Parsed(value);
        }

        if let Some(fenced) = extract_fenced_json(trimmed) {
            if let Ok(value) = serde_json::from_str::<T>(fenced) {
                return StructuredResponse::Parsed(value);
            }
        }

        if let Some(span) = extract_brace_span(trimmed) {
            if let Ok(value) = serde_json::from_str::<T>(span) {
                return StructuredResponse::Parsed(value);
            }
        }

        StructuredResponse::Malformed(raw.to_string())
    }
}

fn extract_fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json").map(|i| i + 7).or_else(|| {
        text.find("```").map(|i| i + 3)
    })?;
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn extract_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
