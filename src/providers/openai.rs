use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::{Client, StatusCode};
use log::error;

use crate::errors::ProviderError;
use super::Provider;

/// Client for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAICompatible {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL; `/chat/completions` is appended
    endpoint: String,
    /// Model used for every request built by this client
    model: String,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Provider-specific reasoning hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
}

/// Message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Generated choices; only the first is used
    pub choices: Vec<ChatChoice>,
    /// Token usage information, absent on some compatible servers
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ChatResponse {
    /// Build a single-choice assistant response
    pub fn from_text(text: impl Into<String>, total_tokens: u64) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: text.into(),
                },
            }],
            usage: Some(TokenUsage {
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens,
            }),
        }
    }

    /// Text of the first choice, empty when there is none
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }

    /// Total tokens billed for this response
    pub fn total_tokens(&self) -> u64 {
        self.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0)
    }
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            reasoning_effort: None,
        }
    }
}

impl ChatRequest {
    /// Create a new request for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token limit
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the reasoning effort hint
    pub fn reasoning_effort(mut self, effort: Option<String>) -> Self {
        self.reasoning_effort = effort;
        self
    }

    /// Content of the first message with the given role
    pub fn message_content(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

impl OpenAICompatible {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// The model name requests should use
    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

/// Map a non-success status to the matching provider error
fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl Provider for OpenAICompatible {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self.client.post(self.api_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Completion API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response.json::<ChatResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = ChatRequest::new(self.model.clone())
            .add_message("user", "Connection test")
            .max_tokens(5);

        self.complete(request).await?;
        Ok(())
    }
}
