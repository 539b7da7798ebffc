//! Mock implementations for testing
//!
//! These mocks enable controller and API testing without real I/O.

use super::traits::*;
use crate::llm::LlmError;
use crate::prompts::{PromptTemplate, PromptVariables};
use crate::retrieval::AgentError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Model Invoker
// ============================================================================

/// A model call as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub template: PromptTemplate,
    pub variables: PromptVariables,
}

impl RecordedCall {
    /// Rendered request text, exactly as a real model would receive it
    pub fn rendered(&self) -> String {
        self.template
            .render(&self.variables)
            .map(|request| {
                request
                    .messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

/// Mock model that returns queued outputs in call order
pub struct MockModelInvoker {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    /// Record of all calls made
    pub calls: Mutex<Vec<RecordedCall>>,
}

#[allow(dead_code)]
impl MockModelInvoker {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Build a mock with the given outputs already queued
    pub fn with_outputs<'a>(outputs: impl IntoIterator<Item = &'a str>) -> Self {
        let mock = Self::new();
        for output in outputs {
            mock.queue_text(output);
        }
        mock
    }

    /// Queue a successful output
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Templates called, in order
    pub fn templates(&self) -> Vec<PromptTemplate> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.template)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Default for MockModelInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelInvoker for MockModelInvoker {
    async fn complete(
        &self,
        template: PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String, LlmError> {
        template
            .render(variables)
            .map_err(|e| LlmError::invalid_request(e.to_string()))?;
        self.calls.lock().unwrap().push(RecordedCall {
            template,
            variables: variables.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

// ============================================================================
// Mock Retrieval Agents
// ============================================================================

/// Mock retrieval agent that returns queued answers
pub struct MockRetrievalAgent {
    answers: Mutex<VecDeque<Result<String, AgentError>>>,
    /// Queries received, in order
    pub queries: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockRetrievalAgent {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_answer(&self, answer: impl Into<String>) {
        self.answers.lock().unwrap().push_back(Ok(answer.into()));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.answers.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockRetrievalAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalAgent for MockRetrievalAgent {
    async fn query(&self, text: &str) -> Result<String, AgentError> {
        self.queries.lock().unwrap().push(text.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AgentError::Unavailable("No mock answer queued".to_string())))
    }
}

/// Retrieval agent that answers every query the same way
pub struct FixedRetrievalAgent(pub String);

impl FixedRetrievalAgent {
    pub fn new(answer: impl Into<String>) -> Self {
        Self(answer.into())
    }
}

#[async_trait]
impl RetrievalAgent for FixedRetrievalAgent {
    async fn query(&self, _text: &str) -> Result<String, AgentError> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// Delayed Mock Model (for timeout testing)
// ============================================================================

/// Model that sleeps before answering
pub struct DelayedModelInvoker {
    delay: Duration,
    output: String,
}

impl DelayedModelInvoker {
    pub fn new(delay: Duration, output: impl Into<String>) -> Self {
        Self {
            delay,
            output: output.into(),
        }
    }
}

#[async_trait]
impl ModelInvoker for DelayedModelInvoker {
    async fn complete(
        &self,
        _template: PromptTemplate,
        _variables: &PromptVariables,
    ) -> Result<String, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.output.clone())
    }
}
