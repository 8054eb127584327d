//! Rule generation orchestrator.
//!
//! Sequences one request through the pipeline:
//!
//! ```text
//! Extracting → Embedding → Mapping → (Rejected | Retrieving) → Generating → Parsing → Done
//! ```
//!
//! The gate sits between mapping and retrieval. A rejected prompt never
//! reaches the generation provider.

use rulewright_core::{
    unrecognized_fields, FieldCatalog, MappingThresholds, PolicyCorpus, RuleRequest, RuleResponse,
    DEFAULT_RETRIEVAL_TOP_K,
};
use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::context::RuleContext;
use crate::embedder::Embedder;
use crate::error::RuleError;
use crate::generator::RuleGenerator;
use crate::mapper::{map_prompt, PromptMapping};
use crate::providers::{CompletionConfig, EmbeddingConfig, EmbeddingProvider, LlmProvider};
use crate::retriever::retrieve_snippets;

/// Pipeline stage, recorded on every trace event for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Embedding,
    Mapping,
    Rejected,
    Retrieving,
    Generating,
    Parsing,
    Done,
}

/// Runs rule generation requests against a shared [`RuleContext`].
///
/// Cheap to share: wrap it in an `Arc` and call [`generate`](Self::generate)
/// from as many tasks as needed.
#[derive(Debug)]
pub struct RuleOrchestrator {
    context: Arc<RuleContext>,
    embedder: Embedder,
    generator: RuleGenerator,
    thresholds: MappingThresholds,
    retrieval_top_k: usize,
}

impl RuleOrchestrator {
    pub fn builder() -> RuleOrchestratorBuilder {
        RuleOrchestratorBuilder::new()
    }

    pub fn context(&self) -> &RuleContext {
        &self.context
    }

    pub fn thresholds(&self) -> &MappingThresholds {
        &self.thresholds
    }

    /// Run a [`RuleRequest`].
    pub async fn generate(&self, request: &RuleRequest) -> Result<RuleResponse, RuleError> {
        self.generate_rule(&request.prompt, request.context_docs()).await
    }

    /// Map a prompt to catalog fields without applying the gate.
    pub async fn map(&self, prompt: &str) -> Result<PromptMapping, RuleError> {
        tracing::debug!(stage = ?Stage::Extracting, "mapping prompt");
        let mapped = map_prompt(prompt, &self.context, &self.embedder, &self.thresholds).await?;
        tracing::debug!(
            stage = ?Stage::Mapping,
            max_similarity = mapped.mapping.max_similarity,
            candidates = ?mapped.mapping.candidate_fields,
            "mapped prompt to fields"
        );
        Ok(mapped)
    }

    /// Generate a rule for `prompt`, considering `context_docs` as extra
    /// policy documents for this request only.
    pub async fn generate_rule(
        &self,
        prompt: &str,
        context_docs: &[String],
    ) -> Result<RuleResponse, RuleError> {
        let PromptMapping { phrases, mapping } = self.map(prompt).await?;

        if let Err(rejection) = mapping.gate(&self.thresholds) {
            tracing::warn!(
                stage = ?Stage::Rejected,
                reason = ?rejection.reason,
                phrases = ?phrases,
                "prompt does not map to catalog fields"
            );
            return Err(rejection.into());
        }

        tracing::debug!(
            stage = ?Stage::Retrieving,
            extra_docs = context_docs.len(),
            "retrieving policy snippets"
        );
        let snippets = retrieve_snippets(
            prompt,
            context_docs,
            &self.context,
            &self.embedder,
            self.retrieval_top_k,
        )
        .await?;

        tracing::debug!(
            stage = ?Stage::Generating,
            candidates = mapping.candidate_fields.len(),
            snippets = snippets.len(),
            "requesting rule generation"
        );
        let rule = self
            .generator
            .generate(
                prompt,
                self.context.catalog(),
                &mapping.candidate_fields,
                &snippets,
            )
            .await?;

        tracing::debug!(stage = ?Stage::Parsing, "auditing generated rule");
        let unrecognized =
            unrecognized_fields(&rule.logic, &rule.used_fields, self.context.catalog());
        if !unrecognized.is_empty() {
            tracing::warn!(
                unrecognized = ?unrecognized,
                "generated rule references fields outside the catalog"
            );
        }

        let confidence = mapping.confidence(self.thresholds.confidence_window);

        tracing::info!(
            stage = ?Stage::Done,
            confidence,
            used_fields = ?rule.used_fields,
            "rule generated"
        );

        Ok(RuleResponse {
            logic: rule.logic,
            explanation: rule.explanation,
            used_fields: rule.used_fields,
            phrase_mappings: mapping.mappings,
            confidence,
            retrieved_snippets: snippets,
            unrecognized_fields: unrecognized,
        })
    }
}

/// Builder for [`RuleOrchestrator`].
///
/// Both providers are required. When no prebuilt context is supplied,
/// [`build`](Self::build) embeds the catalog and corpus (the built-in
/// ones unless overridden).
pub struct RuleOrchestratorBuilder {
    llm: Option<Arc<dyn LlmProvider>>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    context: Option<Arc<RuleContext>>,
    catalog: Option<FieldCatalog>,
    corpus: Option<PolicyCorpus>,
    completion: CompletionConfig,
    embedding: EmbeddingConfig,
    thresholds: MappingThresholds,
    retrieval_top_k: usize,
}

impl RuleOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            embeddings: None,
            context: None,
            catalog: None,
            corpus: None,
            completion: CompletionConfig::default(),
            embedding: EmbeddingConfig::default(),
            thresholds: MappingThresholds::default(),
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
        }
    }

    /// Set the generation provider.
    pub fn llm_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    /// Use an already-built context instead of embedding one.
    pub fn context(mut self, context: Arc<RuleContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn catalog(mut self, catalog: FieldCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn corpus(mut self, corpus: PolicyCorpus) -> Self {
        self.corpus = Some(corpus);
        self
    }

    pub fn thresholds(mut self, thresholds: MappingThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    pub fn completion_config(mut self, config: CompletionConfig) -> Self {
        self.completion = config;
        self
    }

    pub fn embedding_config(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Take models, timeouts, temperature, thresholds and top-k from `config`.
    pub fn config(self, config: &RuntimeConfig) -> Self {
        self.completion_config(config.completion_config())
            .embedding_config(config.embedding_config())
            .thresholds(config.thresholds)
            .retrieval_top_k(config.retrieval_top_k)
    }

    /// Build the orchestrator, embedding the context if none was given.
    pub async fn build(self) -> Result<RuleOrchestrator, RuleError> {
        let llm = self
            .llm
            .ok_or_else(|| RuleError::NotConfigured("No generation provider set".to_string()))?;
        let embeddings = self
            .embeddings
            .ok_or_else(|| RuleError::NotConfigured("No embedding provider set".to_string()))?;

        let embedder = Embedder::new(embeddings, self.embedding);

        let context = match self.context {
            Some(context) => context,
            None => {
                let catalog = match self.catalog {
                    Some(catalog) => catalog,
                    None => FieldCatalog::builtin()?,
                };
                let corpus = self.corpus.unwrap_or_else(PolicyCorpus::builtin);
                Arc::new(RuleContext::build(catalog, corpus, &embedder).await?)
            }
        };

        Ok(RuleOrchestrator {
            context,
            embedder,
            generator: RuleGenerator::new(llm, self.completion),
            thresholds: self.thresholds,
            retrieval_top_k: self.retrieval_top_k,
        })
    }
}

impl Default for RuleOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
