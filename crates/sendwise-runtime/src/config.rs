//! Analyzer configuration from YAML with environment overrides.
//!
//! Layering is built-in defaults, then the YAML file, then environment
//! variables. Validation happens once, when the analyzer is built.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use sendwise_core::InsultLexicon;

use crate::providers::CompletionConfig;

/// Overrides the analysis model id.
pub const ANALYZER_MODEL_ENV: &str = "OPENROUTER_ANALYZER_MODEL";

/// Overrides the refactor model id.
pub const REFACTOR_MODEL_ENV: &str = "OPENROUTER_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ANALYZER_MODEL: &str = "deepseek/deepseek-chat";
pub const DEFAULT_REFACTOR_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("{0}")]
    MissingCredential(String),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub openrouter: OpenRouterConfig,
    pub fallback: FallbackConfig,
}

/// Upstream endpoint and completion settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenRouterConfig {
    /// Bearer key. When absent, `OPENROUTER_API_KEY` is consulted.
    pub api_key: Option<String>,
    pub base_url: String,
    pub analyzer_model: String,
    pub refactor_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(deserialize_with = "humantime_duration")]
    pub timeout: Duration,
    /// Sent as `HTTP-Referer`.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            analyzer_model: DEFAULT_ANALYZER_MODEL.to_string(),
            refactor_model: DEFAULT_REFACTOR_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 2500,
            timeout: Duration::from_secs(30),
            referer: "https://sendwise.app".to_string(),
            title: "Sendwise - Consequence Analyzer".to_string(),
        }
    }
}

impl fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("analyzer_model", &self.analyzer_model)
            .field("refactor_model", &self.refactor_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl OpenRouterConfig {
    /// Completion settings for `model` with this config's sampling and timeout.
    pub fn completion_config(&self, model: &str) -> CompletionConfig {
        CompletionConfig {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

/// Insult lexicon used by the fallback path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub lexicon_version: String,
    pub insult_tokens: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        let lexicon = InsultLexicon::default();
        Self {
            lexicon_version: lexicon.version().to_string(),
            insult_tokens: lexicon.tokens().to_vec(),
        }
    }
}

impl FallbackConfig {
    pub fn to_lexicon(&self) -> InsultLexicon {
        InsultLexicon::new(self.lexicon_version.clone(), &self.insult_tokens)
    }
}

impl AnalyzerConfig {
    /// Parse a config from YAML string. Does not consult the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Defaults or `path`, then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply model overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply model overrides from `lookup`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_blank(ANALYZER_MODEL_ENV) {
            self.openrouter.analyzer_model = model;
        }
        if let Some(model) = non_blank(REFACTOR_MODEL_ENV) {
            self.openrouter.refactor_model = model;
        }
    }

    /// Check every value that would otherwise fail on the first request.
    ///
    /// The credential is checked separately, when the provider is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let or = &self.openrouter;

        if or.analyzer_model.trim().is_empty() {
            return Err(invalid("openrouter.analyzer_model", "must not be empty"));
        }
        if or.refactor_model.trim().is_empty() {
            return Err(invalid("openrouter.refactor_model", "must not be empty"));
        }
        if !(or.base_url.starts_with("https://") || or.base_url.starts_with("http://")) {
            return Err(invalid(
                "openrouter.base_url",
                format!("expected an http(s) URL, got '{}'", or.base_url),
            ));
        }
        if or.timeout.is_zero() {
            return Err(invalid("openrouter.timeout", "must be greater than zero"));
        }
        if or.max_tokens == 0 {
            return Err(invalid("openrouter.max_tokens", "must be greater than zero"));
        }
        if !(0.0..=2.0).contains(&or.temperature) {
            return Err(invalid(
                "openrouter.temperature",
                format!("expected 0.0..=2.0, got {}", or.temperature),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
