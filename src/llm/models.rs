//! Centralized model definitions for all LLM providers

use super::{LlmService, OpenAIService};
use std::sync::Arc;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Groq,
    OpenAI,
}

impl Provider {
    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Chat-completions endpoint, direct or through an OpenAI-compatible gateway
    pub fn endpoint(self, gateway: Option<&str>) -> String {
        match (gateway, self) {
            (Some(gw), Provider::Groq) => {
                format!("{}/groq/openai/v1/chat/completions", gw.trim_end_matches('/'))
            }
            (Some(gw), Provider::OpenAI) => {
                format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/'))
            }
            (None, Provider::Groq) => "https://api.groq.com/openai/v1/chat/completions".to_string(),
            (None, Provider::OpenAI) => "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID
    pub id: &'static str,
    pub provider: Provider,
    /// Name sent to the provider API
    pub api_name: &'static str,
    pub description: &'static str,
}

impl ModelDef {
    /// Build the service for this model
    pub fn create(
        &self,
        api_key: &str,
        gateway: Option<&str>,
    ) -> Result<Arc<dyn LlmService>, String> {
        if api_key.is_empty() {
            return Err(format!(
                "{} requires {} or gateway",
                self.id,
                self.provider.api_key_env_var()
            ));
        }
        let service = OpenAIService::new(
            api_key.to_string(),
            self.id,
            self.api_name,
            &self.provider.endpoint(gateway),
        )
        .map_err(|e| e.message)?;
        Ok(Arc::new(service))
    }
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "llama-3.1-70b",
            provider: Provider::Groq,
            api_name: "llama-3.1-70b-versatile",
            description: "Llama 3.1 70B on Groq (default)",
        },
        ModelDef {
            id: "llama-3.1-8b",
            provider: Provider::Groq,
            api_name: "llama-3.1-8b-instant",
            description: "Llama 3.1 8B on Groq (fast, cheap)",
        },
        ModelDef {
            id: "mixtral-8x7b",
            provider: Provider::Groq,
            api_name: "mixtral-8x7b-32768",
            description: "Mixtral 8x7B on Groq",
        },
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            api_name: "gpt-4o",
            description: "GPT-4o",
        },
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            api_name: "gpt-4o-mini",
            description: "GPT-4o mini (fast, cheap)",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_model_ids_unique() {
        let ids: HashSet<_> = all_models().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), all_models().len());
    }

    #[test]
    fn test_gateway_endpoint() {
        assert_eq!(
            Provider::Groq.endpoint(Some("http://gw/llm/")),
            "http://gw/llm/groq/openai/v1/chat/completions"
        );
        assert_eq!(
            Provider::OpenAI.endpoint(None),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(all_models()[0].create("", None).is_err());
        assert!(all_models()[0].create("key", None).is_ok());
    }
}
