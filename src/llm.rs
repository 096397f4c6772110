use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::LlmConfig;

/// Outcome of a single completion request
pub type CompletionResult = Result<String, CompletionError>;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("OpenRouter API error ({status}): {body}")]
    Http { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Anything that turns a prompt into a completion.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> CompletionResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, prompt: &str) -> CompletionResult {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::user(prompt)],
        };

        let url = self.config.completions_url();
        debug!("Sending request to OpenRouter: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(CompletionError::Http { status, body });
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            CompletionError::Unknown(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
            CompletionError::MalformedResponse(format!("No choices in response: {body}"))
        })?;

        match choice.message.content {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(CompletionError::MalformedResponse(format!(
                "First choice has no content: {body}"
            ))),
        }
    }
}

#[async_trait]
impl Completer for LlmClient {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        info!(
            "Sending prompt to OpenRouter (model {}): '{}...'",
            self.config.model,
            preview(prompt, 50)
        );

        let result = self.send(prompt).await;
        match &result {
            Ok(content) => info!("Received completion, {} chars", content.chars().count()),
            Err(CompletionError::Http { status, body }) => {
                error!("OpenRouter HTTP error: {} - {}", status.as_u16(), body)
            }
            Err(e @ CompletionError::MalformedResponse(_)) => warn!("{}", e),
            Err(e) => error!("Completion failed: {}", e),
        }
        result
    }
}

/// Errors raised before the request leaves the process are not transport problems.
fn classify_transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_builder() {
        CompletionError::Unknown(format!("Failed to build request: {e}"))
    } else {
        CompletionError::Network(format!("{e:#}"))
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
