//! Runtime configuration from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `OPENROUTER_API_KEY` | none, required for network calls |
//! | `OPENROUTER_BASE_URL` | `https://openrouter.ai/api/v1` |
//! | `OPENROUTER_MODEL` | `openai/gpt-4o-mini` |
//! | `OPENROUTER_EMBEDDING_MODEL` | `openai/text-embedding-3-small` |
//! | `RULEWRIGHT_EMBED_TIMEOUT` | `60s` |
//! | `RULEWRIGHT_GENERATION_TIMEOUT` | `120s` |
//! | `RULEWRIGHT_TEMPERATURE` | `0.1` |
//! | `RULEWRIGHT_RELAXED_THRESHOLD` | `0.30` |
//! | `RULEWRIGHT_STRICT_THRESHOLD` | `0.15` |
//! | `RULEWRIGHT_RETRIEVAL_TOP_K` | `3` |
//!
//! Durations use humantime syntax (`90s`, `2m`).

use rulewright_core::{MappingThresholds, DEFAULT_RETRIEVAL_TOP_K};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{
    ApiCredential, CompletionConfig, CredentialSource, EmbeddingConfig, DEFAULT_BASE_URL,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL,
};

#[cfg(feature = "openrouter")]
use crate::providers::{OpenRouterProvider, ProviderError};

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_EMBEDDING_MODEL: &str = "OPENROUTER_EMBEDDING_MODEL";
pub const ENV_EMBED_TIMEOUT: &str = "RULEWRIGHT_EMBED_TIMEOUT";
pub const ENV_GENERATION_TIMEOUT: &str = "RULEWRIGHT_GENERATION_TIMEOUT";
pub const ENV_TEMPERATURE: &str = "RULEWRIGHT_TEMPERATURE";
pub const ENV_RELAXED_THRESHOLD: &str = "RULEWRIGHT_RELAXED_THRESHOLD";
pub const ENV_STRICT_THRESHOLD: &str = "RULEWRIGHT_STRICT_THRESHOLD";
pub const ENV_RETRIEVAL_TOP_K: &str = "RULEWRIGHT_RETRIEVAL_TOP_K";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a duration like '60s' or '2m', got '{value}': {source}")]
    InvalidDuration {
        var: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is out of range: {reason}")]
    OutOfRange { var: &'static str, reason: String },
}

/// Settings for the provider-backed pipeline.
#[derive(Debug)]
pub struct RuntimeConfig {
    /// `None` when no key is configured; offline commands still work
    pub api_key: Option<ApiCredential>,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub embed_timeout: Duration,
    pub generation_timeout: Duration,
    pub temperature: f32,
    pub thresholds: MappingThresholds,
    pub retrieval_top_k: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embed_timeout: Duration::from_secs(60),
            generation_timeout: Duration::from_secs(120),
            temperature: 0.1,
            thresholds: MappingThresholds::default(),
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
        }
    }
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_key = get(ENV_API_KEY).map(|key| {
            ApiCredential::new(key, CredentialSource::Environment, "OpenRouter API key")
        });

        let thresholds = MappingThresholds {
            relaxed: parse_or(
                get(ENV_RELAXED_THRESHOLD),
                ENV_RELAXED_THRESHOLD,
                defaults.thresholds.relaxed,
            )?,
            strict: parse_or(
                get(ENV_STRICT_THRESHOLD),
                ENV_STRICT_THRESHOLD,
                defaults.thresholds.strict,
            )?,
            ..defaults.thresholds
        };

        let config = Self {
            api_key,
            base_url: get(ENV_BASE_URL).unwrap_or(defaults.base_url),
            model: get(ENV_MODEL).unwrap_or(defaults.model),
            embedding_model: get(ENV_EMBEDDING_MODEL).unwrap_or(defaults.embedding_model),
            embed_timeout: duration_or(
                get(ENV_EMBED_TIMEOUT),
                ENV_EMBED_TIMEOUT,
                defaults.embed_timeout,
            )?,
            generation_timeout: duration_or(
                get(ENV_GENERATION_TIMEOUT),
                ENV_GENERATION_TIMEOUT,
                defaults.generation_timeout,
            )?,
            temperature: parse_or(get(ENV_TEMPERATURE), ENV_TEMPERATURE, defaults.temperature)?,
            thresholds,
            retrieval_top_k: parse_or(
                get(ENV_RETRIEVAL_TOP_K),
                ENV_RETRIEVAL_TOP_K,
                defaults.retrieval_top_k,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Range checks shared by environment loading and CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(-1.0..=1.0).contains(&t.relaxed) {
            return Err(ConfigError::OutOfRange {
                var: ENV_RELAXED_THRESHOLD,
                reason: format!("{} is not a cosine similarity in [-1, 1]", t.relaxed),
            });
        }
        if !(-1.0..=1.0).contains(&t.strict) {
            return Err(ConfigError::OutOfRange {
                var: ENV_STRICT_THRESHOLD,
                reason: format!("{} is not a cosine similarity in [-1, 1]", t.strict),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::OutOfRange {
                var: ENV_TEMPERATURE,
                reason: format!("{} is outside [0, 2]", self.temperature),
            });
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::OutOfRange {
                var: ENV_RETRIEVAL_TOP_K,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: None,
            temperature: self.temperature,
            timeout: self.generation_timeout,
        }
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model: self.embedding_model.clone(),
            timeout: self.embed_timeout,
        }
    }

    /// An OpenRouter provider for the configured key and base URL.
    #[cfg(feature = "openrouter")]
    pub fn openrouter_provider(&self) -> Result<OpenRouterProvider, ProviderError> {
        let key = self.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "OpenRouter API key not set: configure '{}' environment variable",
                ENV_API_KEY
            ))
        })?;

        let credential = ApiCredential::new(key.expose(), key.source(), key.name());
        Ok(OpenRouterProvider::from_credential(credential).with_base_url(&self.base_url))
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

fn duration_or(
    raw: Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => humantime::parse_duration(value.trim())
            .map_err(|source| ConfigError::InvalidDuration { var, value, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RuntimeConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.embedding_model, "openai/text-embedding-3-small");
        assert_eq!(config.embed_timeout, Duration::from_secs(60));
        assert_eq!(config.generation_timeout, Duration::from_secs(120));
        assert_eq!(config.thresholds, MappingThresholds::default());
        assert_eq!(config.retrieval_top_k, 3);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_API_KEY, "sk-or-test"),
            (ENV_MODEL, "anthropic/claude-3.5-haiku"),
            (ENV_GENERATION_TIMEOUT, "2m"),
            (ENV_EMBED_TIMEOUT, "15s"),
            (ENV_RELAXED_THRESHOLD, "0.4"),
            (ENV_STRICT_THRESHOLD, " 0.2 "),
            (ENV_RETRIEVAL_TOP_K, "5"),
        ])
        .unwrap();

        assert_eq!(config.api_key.as_ref().unwrap().expose(), "sk-or-test");
        assert_eq!(config.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.generation_timeout, Duration::from_secs(120));
        assert_eq!(config.embed_timeout, Duration::from_secs(15));
        assert!((config.thresholds.relaxed - 0.4).abs() < 1e-6);
        assert!((config.thresholds.strict - 0.2).abs() < 1e-6);
        assert_eq!(config.thresholds.fields_per_phrase, 3);
        assert_eq!(config.retrieval_top_k, 5);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[(ENV_API_KEY, "  "), (ENV_MODEL, "")]).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[(ENV_EMBED_TIMEOUT, "soon")]),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(matches!(
            load(&[(ENV_TEMPERATURE, "warm")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            load(&[(ENV_RELAXED_THRESHOLD, "1.5")]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            load(&[(ENV_RETRIEVAL_TOP_K, "0")]),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let config = load(&[(ENV_API_KEY, "sk-or-very-secret")]).unwrap();
        assert!(!format!("{:?}", config).contains("sk-or-very-secret"));
    }

    #[cfg(feature = "openrouter")]
    #[test]
    fn test_openrouter_provider_requires_key() {
        let config = load(&[]).unwrap();
        assert!(matches!(
            config.openrouter_provider(),
            Err(ProviderError::NotConfigured(_))
        ));

        let config = load(&[(ENV_API_KEY, "sk-or-x"), (ENV_BASE_URL, "http://localhost:9/v1")])
            .unwrap();
        let provider = config.openrouter_provider().unwrap();
        assert_eq!(provider.base_url(), "http://localhost:9/v1");
    }

    #[test]
    fn test_derived_request_configs() {
        let config = load(&[(ENV_TEMPERATURE, "0.3")]).unwrap();
        let completion = config.completion_config();
        assert!((completion.temperature - 0.3).abs() < 1e-6);
        assert_eq!(completion.timeout, Duration::from_secs(120));
        assert_eq!(config.embedding_config().model, "openai/text-embedding-3-small");
    }
}
