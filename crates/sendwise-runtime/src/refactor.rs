//! Rewrites a message in a clear, professional register.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{AnalyzerConfig, ConfigError};
use crate::gateway::{GatewayError, ModelGateway};
use crate::prompts::{build_refactor_prompt, REFACTOR_SYSTEM_PROMPT};
use crate::providers::{LlmProvider, OpenRouterProvider, ProviderError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefactorError {
    #[error("text must not be empty")]
    EmptyText,

    /// Callers usually map this to a bad-gateway style failure.
    #[error("rewrite service unavailable: {0}")]
    Transport(ProviderError),

    #[error("rewrite cancelled")]
    Cancelled,
}

impl From<GatewayError> for RefactorError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(e) => RefactorError::Transport(e),
            GatewayError::Cancelled => RefactorError::Cancelled,
        }
    }
}

/// Sends text to the refactor model with [`REFACTOR_SYSTEM_PROMPT`].
#[derive(Debug, Clone)]
pub struct TextRefactorer {
    gateway: ModelGateway,
}

impl TextRefactorer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AnalyzerConfig) -> Self {
        let completion = config
            .openrouter
            .completion_config(&config.openrouter.refactor_model);
        let gateway =
            ModelGateway::new(provider, completion).with_system_prompt(REFACTOR_SYSTEM_PROMPT);
        Self { gateway }
    }

    /// Build with the OpenRouter provider described by `config`.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let provider = OpenRouterProvider::from_config(&config.openrouter)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Rewrite `text`.
    ///
    /// Blank text fails without a network call. A blank model reply yields
    /// `text` unchanged.
    pub async fn refactor(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, RefactorError> {
        if text.trim().is_empty() {
            return Err(RefactorError::EmptyText);
        }

        tracing::info!(
            text_len = text.chars().count(),
            model = %self.gateway.config().model,
            "Refactoring text"
        );

        match self.gateway.call(&build_refactor_prompt(text), cancel).await {
            Ok(rewritten) => Ok(rewritten.trim().to_string()),
            Err(GatewayError::Transport(ProviderError::EmptyResponse)) => {
                tracing::warn!("Rewrite reply was empty, returning original text");
                Ok(text.to_string())
            }
            Err(err) => {
                if let GatewayError::Transport(e) = &err {
                    tracing::error!(
                        status = ?e.status(),
                        body_len = e.body_len(),
                        error = %e,
                        "Rewrite call failed"
                    );
                }
                Err(err.into())
            }
        }
    }
}
