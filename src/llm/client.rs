//! Async chat-completion client for the judging oracle
//!
//! Speaks both the Anthropic messages API and the OpenAI-compatible chat API
//! (DeepSeek, OpenAI, local servers). Cheap to clone: the underlying reqwest
//! client is reference-counted, so every in-flight oracle call owns one.

use crate::core::error::{GameError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Judgements are short JSON objects; lessons a paragraph
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

impl ApiFormat {
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            Self::Anthropic
        } else {
            Self::OpenAI
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = ApiFormat::detect(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Required: `LLM_API_KEY`. Optional: `LLM_API_URL`, `LLM_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GameError::Oracle("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Ok(Self::new(api_key, api_url, model))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_format(&self) -> ApiFormat {
        self.api_format
    }

    /// One system prompt, one user turn, the model's text back
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        tracing::debug!(model = %self.model, format = ?self.api_format, "llm request");
        let text = match self.api_format {
            ApiFormat::Anthropic => {
                let request = AnthropicRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                    system,
                    messages: vec![Message {
                        role: "user",
                        content: user,
                    }],
                };
                let builder = self
                    .client
                    .post(&self.api_url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&request);
                let response: AnthropicResponse = send(builder).await?;
                response.content.into_iter().next().map(|block| block.text)
            }
            ApiFormat::OpenAI => {
                let request = OpenAIRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                    messages: vec![
                        Message {
                            role: "system",
                            content: system,
                        },
                        Message {
                            role: "user",
                            content: user,
                        },
                    ],
                };
                let builder = self
                    .client
                    .post(&self.api_url)
                    .bearer_auth(&self.api_key)
                    .json(&request);
                let response: OpenAIResponse = send(builder).await?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
            }
        };
        text.filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GameError::Oracle("empty completion".into()))
    }
}

async fn send<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> Result<T> {
    let response = builder
        .send()
        .await
        .map_err(|e| GameError::Oracle(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GameError::Oracle(format!("API error {status}: {body}")));
    }

    response
        .json()
        .await
        .map_err(|e| GameError::Malformed(e.to_string()))
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}
