//! Consequence analysis orchestrator.
//!
//! Drives one request through the pipeline:
//! 1. Validate the caller's text (no network on failure)
//! 2. Render the prompt
//! 3. One model call through the [`ModelGateway`]
//! 4. Parse and validate the reply
//! 5. On transport or parse failure, return the deterministic fallback
//!
//! Upstream failures never reach the caller. Only invalid input and caller
//! cancellation do.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use sendwise_core::{
    validate_text, ConsequenceAnalysis, FallbackAnalyzer, InputError, InsultLexicon, ParseError,
    ResponseParser,
};

use crate::config::{AnalyzerConfig, ConfigError};
use crate::gateway::{GatewayError, ModelGateway};
use crate::prompts::build_analysis_prompt;
use crate::providers::{LlmProvider, OpenRouterProvider, ProviderError};

/// Context used when the caller gives none.
pub const DEFAULT_CONTEXT: &str = "workplace";

/// Country code used when the caller gives none.
pub const DEFAULT_COUNTRY: &str = "CO";

/// Errors visible to callers of the analyzer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("analysis cancelled")]
    Cancelled,
}

/// One message to assess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text: String,
    /// Situational frame, e.g. workplace, academic or personal
    pub context: String,
    /// Country code such as "CO"
    pub country: String,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: DEFAULT_CONTEXT.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}

/// How the model attempt ended, before any fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Success(ConsequenceAnalysis),
    TransportFailure(ProviderError),
    ParseFailure { error: ParseError, raw_len: usize },
}

impl AnalysisOutcome {
    /// `model` when the reply is used, `fallback` otherwise.
    pub fn branch(&self) -> &'static str {
        match self {
            AnalysisOutcome::Success(_) => "model",
            _ => "fallback",
        }
    }
}

/// Turns text plus context into a complete [`ConsequenceAnalysis`].
///
/// Stateless between requests; share one instance behind an `Arc`.
pub struct ConsequenceAnalyzer {
    gateway: ModelGateway,
    parser: ResponseParser,
    fallback: FallbackAnalyzer,
}

impl std::fmt::Debug for ConsequenceAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsequenceAnalyzer")
            .field("gateway", &self.gateway)
            .field("lexicon_version", &self.fallback.lexicon().version())
            .finish()
    }
}

impl ConsequenceAnalyzer {
    pub fn new(gateway: ModelGateway, fallback: FallbackAnalyzer) -> Self {
        Self {
            gateway,
            parser: ResponseParser::new(),
            fallback,
        }
    }

    /// Build with the OpenRouter provider described by `config`.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        ConsequenceAnalyzerBuilder::new().config(config).build()
    }

    pub fn builder() -> ConsequenceAnalyzerBuilder {
        ConsequenceAnalyzerBuilder::new()
    }

    pub fn fallback(&self) -> &FallbackAnalyzer {
        &self.fallback
    }

    /// Analyze `request`. Fails only on invalid input.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<ConsequenceAnalysis, AnalyzeError> {
        self.analyze_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Analyze `request`, giving up with [`AnalyzeError::Cancelled`] when
    /// `cancel` fires before the model reply arrives.
    pub async fn analyze_with_cancellation(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<ConsequenceAnalysis, AnalyzeError> {
        let outcome = self.attempt(request, cancel).await?;
        Ok(self.resolve(outcome, &request.text))
    }

    /// Validate, prompt, call and parse without falling back.
    pub async fn attempt(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let text_len = request.text.chars().count();

        if let Err(e) = validate_text(&request.text) {
            tracing::warn!(text_len, bound = e.bound(), "Rejected analysis input");
            return Err(e.into());
        }

        tracing::info!(
            text_len,
            context = %request.context,
            country = %request.country,
            model = %self.gateway.config().model,
            "Starting consequence analysis"
        );

        let prompt = build_analysis_prompt(&request.text, &request.context, &request.country);

        let raw = match self.gateway.call(&prompt, cancel).await {
            Ok(raw) => raw,
            Err(GatewayError::Cancelled) => {
                tracing::info!(text_len, "Consequence analysis cancelled");
                return Err(AnalyzeError::Cancelled);
            }
            Err(GatewayError::Transport(e)) => return Ok(AnalysisOutcome::TransportFailure(e)),
        };

        Ok(match self.parser.parse(&raw) {
            Ok(analysis) => AnalysisOutcome::Success(analysis),
            Err(error) => AnalysisOutcome::ParseFailure {
                error,
                raw_len: raw.len(),
            },
        })
    }

    /// Turn an outcome into the final result, logging the branch taken.
    pub fn resolve(&self, outcome: AnalysisOutcome, text: &str) -> ConsequenceAnalysis {
        let branch = outcome.branch();

        match outcome {
            AnalysisOutcome::Success(analysis) => {
                tracing::info!(
                    branch,
                    recommendation = %analysis.actionable_recommendations.final_recommendation,
                    "Consequence analysis completed"
                );
                return analysis;
            }
            AnalysisOutcome::TransportFailure(e) => {
                tracing::error!(
                    branch,
                    status = ?e.status(),
                    body_len = e.body_len(),
                    error = %e,
                    "Model call failed"
                );
            }
            AnalysisOutcome::ParseFailure { error, raw_len } => {
                tracing::error!(
                    branch,
                    stage = %error.stage(),
                    raw_len,
                    error = %error,
                    "Model reply rejected"
                );
            }
        }

        tracing::warn!(
            branch,
            lexicon_version = self.fallback.lexicon().version(),
            "Returning fallback analysis"
        );
        self.fallback.build(text)
    }
}

/// Builder for [`ConsequenceAnalyzer`].
pub struct ConsequenceAnalyzerBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: AnalyzerConfig,
    lexicon: Option<InsultLexicon>,
}

impl ConsequenceAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: AnalyzerConfig::default(),
            lexicon: None,
        }
    }

    /// Use this provider instead of building one from the config.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the lexicon from `config.fallback`.
    pub fn lexicon(mut self, lexicon: InsultLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Validate the config and resolve the credential.
    pub fn build(self) -> Result<ConsequenceAnalyzer, ConfigError> {
        self.config.validate()?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(OpenRouterProvider::from_config(&self.config.openrouter)?),
        };

        let completion = self
            .config
            .openrouter
            .completion_config(&self.config.openrouter.analyzer_model);
        let gateway = ModelGateway::new(provider, completion);

        let lexicon = self
            .lexicon
            .unwrap_or_else(|| self.config.fallback.to_lexicon());

        Ok(ConsequenceAnalyzer::new(
            gateway,
            FallbackAnalyzer::new(lexicon),
        ))
    }
}

impl Default for ConsequenceAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
