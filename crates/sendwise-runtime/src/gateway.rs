//! Single outbound model call with timeout and cancellation.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};

/// Why a gateway call produced no text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] ProviderError),

    #[error("call cancelled by caller")]
    Cancelled,
}

/// Sends one prompt to one model and returns the raw reply text.
///
/// Performs exactly one request per call. The provider's own HTTP timeout
/// and an outer `tokio::time::timeout` both bound the call.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    system_prompt: Option<String>,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("system_prompt", &self.system_prompt.is_some())
            .finish()
    }
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self {
            provider,
            config,
            system_prompt: None,
        }
    }

    /// Prepend a system message to every call.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` as the user message.
    ///
    /// Cancellation is checked first and then raced against the request;
    /// the in-flight request is dropped when the token fires.
    pub async fn call(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.as_str()));
        }
        messages.push(ChatMessage::user(prompt));

        let timeout = self.config.timeout;
        let request = tokio::time::timeout(timeout, self.provider.complete(messages, &self.config));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = request => match result {
                Ok(inner) => inner?,
                Err(_) => return Err(ProviderError::Timeout(timeout).into()),
            },
        };

        if response.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Model call completed"
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the messages it receives and replies after `delay`.
    struct MockProvider {
        reply: Result<String, ProviderError>,
        delay: Duration,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl MockProvider {
        fn replying(reply: Result<&str, ProviderError>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(messages);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone().map(|content| CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: config.model.clone(),
                finish_reason: Some("stop".to_string()),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn gateway(provider: Arc<MockProvider>) -> ModelGateway {
        ModelGateway::new(provider, CompletionConfig::default())
    }

    #[tokio::test]
    async fn test_returns_raw_text() {
        let provider = Arc::new(MockProvider::replying(Ok("raw reply")));
        let text = gateway(provider.clone())
            .call("prompt", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "raw reply");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec![ChatMessage::user("prompt")]);
    }

    #[tokio::test]
    async fn test_system_prompt_comes_first() {
        let provider = Arc::new(MockProvider::replying(Ok("ok")));
        gateway(provider.clone())
            .with_system_prompt("be formal")
            .call("text", &CancellationToken::new())
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0][0], ChatMessage::system("be formal"));
        assert_eq!(seen[0][1], ChatMessage::user("text"));
    }

    #[tokio::test]
    async fn test_provider_error_is_transport() {
        let provider = Arc::new(MockProvider::replying(Err(ProviderError::Api {
            status: 503,
            body: String::new(),
        })));
        let err = gateway(provider)
            .call("prompt", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Transport(ProviderError::Api { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_reply_is_empty_response() {
        let provider = Arc::new(MockProvider::replying(Ok("  \n")));
        let err = gateway(provider)
            .call("prompt", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Transport(ProviderError::EmptyResponse));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let provider =
            Arc::new(MockProvider::replying(Ok("late")).delayed(Duration::from_secs(60)));
        let err = gateway(provider)
            .call("prompt", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Transport(ProviderError::Timeout(Duration::from_secs(30)))
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_call_skips_provider() {
        let provider = Arc::new(MockProvider::replying(Ok("ok")));
        let token = CancellationToken::new();
        token.cancel();

        let err = gateway(provider.clone()).call("prompt", &token).await.unwrap_err();

        assert_eq!(err, GatewayError::Cancelled);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_call() {
        let provider =
            Arc::new(MockProvider::replying(Ok("late")).delayed(Duration::from_secs(10)));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = gateway(provider).call("prompt", &token).await.unwrap_err();
        assert_eq!(err, GatewayError::Cancelled);
    }
}
