//! # rulewright-runtime
//!
//! Provider-backed rule generation.
//!
//! Turns a natural-language credit policy statement into a JSON Logic rule
//! over a fixed field catalog. The deterministic pieces (phrase splitting,
//! similarity, mapping, ranking) live in `rulewright-core`; this crate adds
//! the embedding and generation calls around them.
//!
//! ## Pipeline
//!
//! 1. Split the prompt into phrases and embed them
//! 2. Rank catalog fields per phrase and apply the gate
//! 3. Retrieve the most relevant policy snippets
//! 4. Ask the model for a rule restricted to catalog fields
//! 5. Parse, audit and score the result
//!
//! A prompt that fails the gate comes back as [`RuleError::Mapping`] and
//! never reaches the generation provider.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rulewright_runtime::{RuleOrchestrator, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env()?;
//! let provider = Arc::new(config.openrouter_provider()?);
//!
//! let orchestrator = RuleOrchestrator::builder()
//!     .llm_provider(provider.clone())
//!     .embedding_provider(provider)
//!     .config(&config)
//!     .build()
//!     .await?;
//!
//! let response = orchestrator
//!     .generate_rule("bureau score below 600 and overdue amount above 50000", &[])
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod config;
pub mod context;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod mapper;
pub mod orchestrator;
pub mod output;
pub mod prompts;
pub mod providers;
pub mod retriever;

pub use config::{ConfigError, RuntimeConfig};
pub use context::{ContextError, RuleContext};
pub use embedder::Embedder;
pub use error::RuleError;
pub use generator::RuleGenerator;
pub use mapper::{map_prompt, MappingReport, PromptMapping};
pub use orchestrator::{RuleOrchestrator, RuleOrchestratorBuilder, Stage};
pub use output::{parse_generated_rule, strip_code_fence, OutputParseError};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, EmbeddingConfig, EmbeddingProvider,
    LlmProvider, ProviderError, TokenUsage,
};
pub use retriever::retrieve_snippets;

#[cfg(feature = "openrouter")]
pub use providers::OpenRouterProvider;
