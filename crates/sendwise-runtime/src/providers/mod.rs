//! LLM provider abstractions for sendwise-runtime.
//!
//! This module defines the trait for chat-completion providers and the
//! OpenRouter implementation used in production.
//!
//! ## Security
//!
//! Providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod openrouter;
pub mod secrets;

pub use openrouter::{OpenRouterProvider, OPENROUTER_API_KEY_ENV, OPENROUTER_BASE_URL};
pub use secrets::{ApiCredential, CredentialSource};

/// Upstream error bodies are cut to this many characters before being kept.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Transport-level failures reaching or reading from the upstream model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Malformed completion envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// HTTP status, when the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Length of the upstream error body, zero when there was none.
    pub fn body_len(&self) -> usize {
        match self {
            ProviderError::Api { body, .. } => body.len(),
            _ => 0,
        }
    }
}

/// Cut an upstream body down to [`MAX_ERROR_BODY_CHARS`] characters.
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature (low favors repeatable answers)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat".to_string(),
            max_tokens: 2500,
            temperature: 0.2,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content of the single completion
    pub content: String,

    /// Token usage, when reported
    pub usage: TokenUsage,

    /// Model that served the request
    pub model: String,

    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// Implementations perform exactly one outbound request per call and never
/// retry. They must be safe to share across concurrent requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}
