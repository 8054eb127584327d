//! Rule generation via an LLM provider.

use rulewright_core::{FieldCatalog, GeneratedRule};
use std::sync::Arc;

use crate::error::RuleError;
use crate::output::parse_generated_rule;
use crate::prompts::{build_user_prompt, SYSTEM_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};

/// Drafts a JSON Logic rule from a prompt and its retrieved context.
#[derive(Clone)]
pub struct RuleGenerator {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
}

impl std::fmt::Debug for RuleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleGenerator")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl RuleGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// The two messages sent for one request: system directive, then the
    /// assembled user prompt.
    pub fn messages(
        prompt: &str,
        catalog: &FieldCatalog,
        candidate_fields: &[String],
        snippets: &[String],
    ) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(prompt, catalog, candidate_fields, snippets)),
        ]
    }

    /// Make one generation call and parse its output.
    pub async fn generate(
        &self,
        prompt: &str,
        catalog: &FieldCatalog,
        candidate_fields: &[String],
        snippets: &[String],
    ) -> Result<GeneratedRule, RuleError> {
        let messages = Self::messages(prompt, catalog, candidate_fields, snippets);

        let response = self.provider.complete(messages, &self.config).await?;

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            stop_reason = ?response.stop_reason,
            "generation call complete"
        );

        let rule = parse_generated_rule(&response.content).inspect_err(|e| {
            tracing::warn!(
                provider = self.provider.name(),
                error = %e,
                "unparseable generation output"
            )
        })?;

        Ok(rule)
    }
}
