//! Secure credential handling for the upstream model API.
//!
//! Using this module ensures:
//!
//! - **No accidental logging**: credentials cannot appear in Debug/Display output
//! - **Memory safety**: credentials are zeroed on drop
//! - **Explicit exposure**: the raw value is only reachable through `.expose()`
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! let cred = ApiCredential::from_config_or_env(
//!     config.api_key.as_deref(),
//!     "openrouter.api_key",
//!     "OPENROUTER_API_KEY",
//!     "OpenRouter API key",
//! )?;
//!
//! request.bearer_auth(cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::config::ConfigError;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the configuration file
    Config,
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// Debug and Display print `[REDACTED]`; the value is zeroed on drop.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap `value` immediately; it cannot be logged after this point.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from an environment variable. Empty values count as unset.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ConfigError> {
        Self::resolve(None, |key| std::env::var(key).ok(), "", env_var, name)
    }

    /// Load from the config value, falling back to `env_var`.
    ///
    /// 1. A non-blank `config_value` wins
    /// 2. Otherwise a non-blank `env_var` is used
    /// 3. Otherwise [`ConfigError::MissingCredential`]
    pub fn from_config_or_env(
        config_value: Option<&str>,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ConfigError> {
        Self::resolve(
            config_value,
            |key| std::env::var(key).ok(),
            config_key,
            env_var,
            name,
        )
    }

    /// Same as [`from_config_or_env`](Self::from_config_or_env) with an
    /// injectable environment lookup.
    pub fn resolve<F>(
        config_value: Option<&str>,
        lookup: F,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = config_value.filter(|v| !v.trim().is_empty()) {
            return Ok(Self::new(value.trim(), CredentialSource::Config, name));
        }

        if let Some(value) = lookup(env_var).filter(|v| !v.trim().is_empty()) {
            return Ok(Self::new(value.trim(), CredentialSource::Environment, name));
        }

        let message = if config_key.is_empty() {
            format!("{} not set: configure '{}' environment variable", name, env_var)
        } else {
            format!(
                "{} required: set '{}' in config or {} environment variable",
                name, config_key, env_var
            )
        };
        Err(ConfigError::MissingCredential(message))
    }

    /// Expose the credential value for use in API calls.
    ///
    /// Only call this where the credential is actually needed, e.g. when
    /// setting the Authorization header. Never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
