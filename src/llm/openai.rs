//! OpenAI-compatible chat-completions provider (Groq and `OpenAI`)

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    api_name: String,
    base_url: String,
    model_id: String,
}

impl OpenAIService {
    /// `endpoint` is the full chat-completions URL for the provider
    pub fn new(
        api_key: String,
        model_id: &str,
        api_name: &str,
        endpoint: &str,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_name: api_name.to_string(),
            base_url: endpoint.to_string(),
            model_id: model_id.to_string(),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.api_name.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            let error = LlmError::from_status(status.as_u16(), &message);
            return Err(match retry_after {
                Some(delay) => error.with_retry_after(delay),
                None => error,
            });
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
