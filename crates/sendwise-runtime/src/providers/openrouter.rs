//! OpenRouter chat-completions provider.
//!
//! OpenRouter exposes many upstream models behind one OpenAI-compatible API.
//!
//! ## Security
//!
//! The bearer key is held in an [`ApiCredential`] and only exposed when the
//! Authorization header is set.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::secrets::{ApiCredential, CredentialSource};
use super::{
    truncate_body, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    TokenUsage,
};
use crate::config::{ConfigError, OpenRouterConfig, DEFAULT_BASE_URL};

/// Environment variable consulted when the config carries no key.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub const OPENROUTER_BASE_URL: &str = DEFAULT_BASE_URL;

const CREDENTIAL_NAME: &str = "OpenRouter API key";

/// OpenRouter provider.
///
/// Holds one pooled [`reqwest::Client`]; share it across requests.
pub struct OpenRouterProvider {
    credential: ApiCredential,
    base_url: String,
    referer: String,
    title: String,
    client: Client,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl OpenRouterProvider {
    /// Create a provider with a programmatic key and default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = OpenRouterConfig::default();
        Self {
            credential: ApiCredential::new(api_key, CredentialSource::Programmatic, CREDENTIAL_NAME),
            base_url: OPENROUTER_BASE_URL.to_string(),
            referer: defaults.referer,
            title: defaults.title,
            client: build_client(defaults.timeout),
        }
    }

    /// Create from configuration, falling back to `OPENROUTER_API_KEY`.
    pub fn from_config(config: &OpenRouterConfig) -> Result<Self, ConfigError> {
        let credential = ApiCredential::from_config_or_env(
            config.api_key.as_deref(),
            "openrouter.api_key",
            OPENROUTER_API_KEY_ENV,
            CREDENTIAL_NAME,
        )?;

        tracing::debug!(source = %credential.source(), "Resolved OpenRouter credential");

        Ok(Self {
            credential,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            client: build_client(config.timeout),
        })
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credential_source(&self) -> CredentialSource {
        self.credential.source()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<OpenRouterUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    #[serde(default)]
    message: Option<OpenRouterResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = OpenRouterRequest {
            model: &config.model,
            messages: &messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.credential.expose())
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: OpenRouterResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedEnvelope(e.to_string()))?;

        let choice = body.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let content = choice
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = body.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model.unwrap_or_else(|| config.model.clone()),
            finish_reason,
        })
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenRouterProvider {
        OpenRouterProvider::new("sk-or-test").with_base_url(server.uri())
    }

    fn config() -> CompletionConfig {
        CompletionConfig {
            model: "deepseek/deepseek-chat".to_string(),
            timeout: Duration::from_secs(5),
            ..CompletionConfig::default()
        }
    }

    #[test]
    fn test_request_serializes_correctly() {
        let messages = vec![ChatMessage::user("Hola")];
        let req = OpenRouterRequest {
            model: "deepseek/deepseek-chat",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 2500,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "deepseek/deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 2500);
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = OpenRouterProvider::new("sk-or-very-secret");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-or-very-secret"));
    }

    #[test]
    fn test_from_config_uses_config_key() {
        let config = OpenRouterConfig {
            api_key: Some("sk-or-from-config".to_string()),
            base_url: "https://proxy.example.com/api/v1/".to_string(),
            ..OpenRouterConfig::default()
        };
        let provider = OpenRouterProvider::from_config(&config).unwrap();
        assert_eq!(provider.credential_source(), CredentialSource::Config);
        assert_eq!(
            provider.endpoint(),
            "https://proxy.example.com/api/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(header("X-Title", "Sendwise - Consequence Analyzer"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek/deepseek-chat",
                "max_tokens": 2500
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "deepseek/deepseek-chat",
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"ok\": true}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .complete(vec![ChatMessage::user("prompt")], &config())
            .await
            .unwrap();

        assert_eq!(response.content, "{\"ok\": true}");
        assert_eq!(response.usage.total(), 16);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(2000)))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(vec![ChatMessage::user("prompt")], &config())
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.chars().count(), 512 + 3);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(vec![ChatMessage::user("prompt")], &config())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(Duration::from_secs(7))
            }
        );
    }

    #[tokio::test]
    async fn test_missing_or_null_content_is_empty_response() {
        for body in [
            serde_json::json!({"choices": []}),
            serde_json::json!({"choices": [{"message": {"content": null}}]}),
            serde_json::json!({"choices": [{"message": {"content": "   "}}]}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let err = provider_for(&server)
                .complete(vec![ChatMessage::user("prompt")], &config())
                .await
                .unwrap_err();
            assert_eq!(err, ProviderError::EmptyResponse);
        }
    }

    #[tokio::test]
    async fn test_non_json_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(vec![ChatMessage::user("prompt")], &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedEnvelope(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let config = CompletionConfig {
            timeout: Duration::from_millis(100),
            ..config()
        };
        let err = provider_for(&server)
            .complete(vec![ChatMessage::user("prompt")], &config)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Timeout(Duration::from_millis(100)));
    }
}
