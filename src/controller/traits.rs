//! Trait abstractions for controller I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{LlmError, ModelRegistry};
use crate::prompts::{PromptTemplate, PromptVariables};
use crate::retrieval::AgentError;
use async_trait::async_trait;
use std::sync::Arc;

/// Renders a prompt template and returns the model's text
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn complete(
        &self,
        template: PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String, LlmError>;
}

/// External retrieval crew, reachable only as `query -> answer`
#[async_trait]
pub trait RetrievalAgent: Send + Sync {
    async fn query(&self, text: &str) -> Result<String, AgentError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ModelInvoker + ?Sized> ModelInvoker for Arc<T> {
    async fn complete(
        &self,
        template: PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String, LlmError> {
        (**self).complete(template, variables).await
    }
}

#[async_trait]
impl<T: RetrievalAgent + ?Sized> RetrievalAgent for Arc<T> {
    async fn query(&self, text: &str) -> Result<String, AgentError> {
        (**self).query(text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Model used by each step; `None` means the registry default
#[derive(Debug, Clone, Default)]
pub struct StepModels {
    pub decision: Option<String>,
    pub query: Option<String>,
    pub response: Option<String>,
}

impl StepModels {
    fn for_template(&self, template: PromptTemplate) -> Option<&str> {
        match template {
            PromptTemplate::Decide => self.decision.as_deref(),
            PromptTemplate::FormulateQuery => self.query.as_deref(),
            PromptTemplate::Respond => self.response.as_deref(),
        }
    }
}

/// Adapter to use ModelRegistry as ModelInvoker
pub struct RegistryModelInvoker {
    registry: Arc<ModelRegistry>,
    models: StepModels,
}

impl RegistryModelInvoker {
    pub fn new(registry: Arc<ModelRegistry>, models: StepModels) -> Self {
        Self { registry, models }
    }
}

#[async_trait]
impl ModelInvoker for RegistryModelInvoker {
    async fn complete(
        &self,
        template: PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String, LlmError> {
        let request = template
            .render(variables)
            .map_err(|e| LlmError::invalid_request(e.to_string()))?;
        let llm = self
            .registry
            .get_or_default(self.models.for_template(template))
            .ok_or_else(|| LlmError::network("No LLM available"))?;

        tracing::debug!(
            template = template.id(),
            model = llm.model_id(),
            "Invoking model"
        );
        let response = llm.complete(&request).await?;
        Ok(response.text)
    }
}
