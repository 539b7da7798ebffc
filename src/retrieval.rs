//! Client for the external retrieval agent crew
//!
//! The crew is reachable only through a `query -> answer` contract: POST
//! `{"query": "..."}` and read back either `{"answer": "..."}` (or the
//! crew's `raw` output field) or a plain-text body.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::controller::RetrievalAgent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Retrieval agent failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    /// Transport failure or non-success response
    #[error("Retrieval agent unavailable: {0}")]
    Unavailable(String),
    /// The agent answered with nothing usable
    #[error("Retrieval agent returned no answer")]
    NoAnswer,
    #[error("Retrieval agent is not configured (set RETRIEVAL_AGENT_URL)")]
    Unconfigured,
}

impl AgentError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Unavailable(_))
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Retrieval agent reached over HTTP
pub struct HttpRetrievalAgent {
    client: Client,
    url: String,
}

impl HttpRetrievalAgent {
    pub fn new(url: impl Into<String>) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Unavailable(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RetrievalAgent for HttpRetrievalAgent {
    async fn query(&self, text: &str) -> Result<String, AgentError> {
        let response = self
            .client
            .post(&self.url)
            .json(&QueryRequest { query: text })
            .send()
            .await
            .map_err(|e| AgentError::Unavailable(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AgentError::Unavailable(format!("HTTP {status}: {body}")));
        }

        extract_answer(&body)
    }
}

/// Pull the answer text out of a response body
fn extract_answer(body: &str) -> Result<String, AgentError> {
    let answer = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => ["answer", "raw"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(json_text))
            .unwrap_or_default(),
        Ok(value) => json_text(&value).unwrap_or_default(),
        Err(_) => body.to_string(),
    };

    if answer.trim().is_empty() {
        Err(AgentError::NoAnswer)
    } else {
        Ok(answer)
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Stand-in used when no retrieval endpoint is configured. Every query
/// fails, so turns that decide to query surface an error to the host.
pub struct UnconfiguredRetrievalAgent;

#[async_trait]
impl RetrievalAgent for UnconfiguredRetrievalAgent {
    async fn query(&self, _text: &str) -> Result<String, AgentError> {
        Err(AgentError::Unconfigured)
    }
}
