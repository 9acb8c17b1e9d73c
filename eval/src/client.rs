// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Language model client boundary
//!
//! The classifier only needs one operation: send a system and user prompt,
//! get text back. [`OpenAiClient`] implements it against an OpenAI-compatible
//! chat completions endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors raised by a model client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// A single generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// Anything that can turn a prompt into text
pub trait ModelClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError>;

    /// Model identifier, for logs and reports
    fn model_name(&self) -> &str;
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        (**self).generate(request)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Connection settings for [`OpenAiClient`]
#[derive(Clone, Serialize)]
pub struct ClientConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Read settings from the environment, loading `.env` first if present.
    ///
    /// - `OPENAI_API_KEY` (required)
    /// - `OPENAI_MODEL` (default `gpt-4o-mini`)
    /// - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `OPENAI_TIMEOUT_SECS` (default 60)
    pub fn from_env() -> Result<Self, ClientError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClientError::MissingApiKey)?;

        let timeout_secs = match std::env::var("OPENAI_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ClientError::InvalidConfig(format!("OPENAI_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout_secs,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(model: &'a str, request: &'a GenerationRequest) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice
    fn into_text(self) -> Result<String, ClientError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::MalformedResponse("response has no choices".to_string()))?
            .message
            .content
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ClientError::MalformedResponse("first choice has no content".to_string()))
    }
}

/// Blocking client for OpenAI-compatible chat completion APIs
pub struct OpenAiClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ModelClient for OpenAiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let body = ChatCompletionRequest::new(&self.config.model, request);

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        parsed.into_text()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
