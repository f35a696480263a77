//! # sendwise-runtime
//!
//! Model-backed consequence analysis for Sendwise.
//!
//! This crate owns everything that talks to the upstream model: configuration,
//! credentials, the OpenRouter provider, the gateway that bounds each call,
//! and the orchestrator that falls back to `sendwise-core` when the model
//! fails.
//!
//! ## Important
//!
//! [`ConsequenceAnalyzer::analyze`] never surfaces an upstream failure. It
//! returns a model-backed result, or the deterministic fallback, or an
//! [`AnalyzeError`] for invalid input and caller cancellation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sendwise_runtime::{AnalysisRequest, AnalyzerConfig, ConsequenceAnalyzer};
//!
//! let config = AnalyzerConfig::load(None)?;
//! let analyzer = ConsequenceAnalyzer::from_config(config)?;
//!
//! let request = AnalysisRequest::new("Solicito el pago de mis horas extra.")
//!     .with_country("PE");
//! let analysis = analyzer.analyze(&request).await?;
//! ```

pub mod config;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod refactor;

pub use config::{AnalyzerConfig, ConfigError, FallbackConfig, OpenRouterConfig};
pub use gateway::{GatewayError, ModelGateway};
pub use orchestrator::{
    AnalysisOutcome, AnalysisRequest, AnalyzeError, ConsequenceAnalyzer,
    ConsequenceAnalyzerBuilder, DEFAULT_CONTEXT, DEFAULT_COUNTRY,
};
pub use prompts::build_analysis_prompt;
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, OpenRouterProvider, ProviderError, TokenUsage,
};
pub use refactor::{RefactorError, TextRefactorer};

pub use sendwise_core;
