//! Model registry for managing available LLM providers

use super::{all_models, LlmService, LoggingService, ModelDef, Provider};
use std::collections::HashMap;
use std::sync::Arc;

const PREFERRED_DEFAULT: &str = "llama-3.1-70b";

/// Configuration for LLM providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible gateway base URL
    pub gateway: Option<String>,
    /// Default model ID
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            default_model: std::env::var("DEFAULT_MODEL").ok(),
        }
    }
}

/// Registry of available LLM models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        for model_def in all_models() {
            if let Some(service) = Self::try_create_model(model_def, config) {
                services.insert(model_def.id.to_string(), service);
            }
        }

        let default_model = config
            .default_model
            .clone()
            .or_else(|| {
                if services.contains_key(PREFERRED_DEFAULT) {
                    Some(PREFERRED_DEFAULT.to_string())
                } else {
                    let mut ids: Vec<_> = services.keys().cloned().collect();
                    ids.sort();
                    ids.into_iter().next()
                }
            })
            .unwrap_or_else(|| PREFERRED_DEFAULT.to_string());

        Self {
            services,
            default_model,
        }
    }

    /// Try to create a model service, validating prerequisites
    fn try_create_model(model_def: &ModelDef, config: &LlmConfig) -> Option<Arc<dyn LlmService>> {
        // The gateway handles authentication itself
        let api_key = if config.gateway.is_some() {
            "implicit".to_string()
        } else {
            match model_def.provider {
                Provider::Groq => config.groq_api_key.as_ref()?,
                Provider::OpenAI => config.openai_api_key.as_ref()?,
            }
            .clone()
        };

        match model_def.create(&api_key, config.gateway.as_deref()) {
            Ok(service) => Some(Arc::new(LoggingService::new(service))),
            Err(e) => {
                tracing::debug!(model = model_def.id, error = %e, "Model unavailable");
                None
            }
        }
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LlmService>> {
        self.services.get(model_id).cloned()
    }

    /// Get the default model
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.default_model)
    }

    /// Get a model by ID, falling back to the default
    pub fn get_or_default(&self, model_id: Option<&str>) -> Option<Arc<dyn LlmService>> {
        model_id.and_then(|id| self.get(id)).or_else(|| self.default())
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }

    /// Catalogue entries for the models that are configured, sorted by ID
    pub fn available_model_defs(&self) -> Vec<&'static ModelDef> {
        let mut defs: Vec<_> = all_models()
            .iter()
            .filter(|def| self.services.contains_key(def.id))
            .collect();
        defs.sort_by_key(|def| def.id);
        defs
    }

    pub fn has_models(&self) -> bool {
        !self.services.is_empty()
    }
}
