//! Process configuration read from the environment

use crate::controller::{ControllerConfig, StepModels};
use crate::state_machine::ContextScope;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;

/// Everything the binary needs besides provider credentials,
/// which `LlmConfig` reads on its own
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub port: u16,
    pub controller: ControllerConfig,
    pub models: StepModels,
    /// Retrieval crew endpoint; unset means every query fails
    pub retrieval_url: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            controller: ControllerConfig::default(),
            models: StepModels::default(),
            retrieval_url: None,
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Values that fail to parse fall
    /// back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ControllerConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_invalid_decisions = parse_or(
            "ASSISTANT_MAX_INVALID_DECISIONS",
            non_empty("ASSISTANT_MAX_INVALID_DECISIONS"),
            defaults.max_invalid_decisions,
        )
        .max(1);
        let max_retrieval_rounds = parse_or(
            "ASSISTANT_MAX_RETRIEVAL_ROUNDS",
            non_empty("ASSISTANT_MAX_RETRIEVAL_ROUNDS"),
            defaults.max_retrieval_rounds,
        );
        let timeout_secs = parse_or(
            "ASSISTANT_CALL_TIMEOUT_SECS",
            non_empty("ASSISTANT_CALL_TIMEOUT_SECS"),
            defaults.call_timeout.as_secs(),
        );
        let context_scope = parse_or(
            "ASSISTANT_CONTEXT_SCOPE",
            non_empty("ASSISTANT_CONTEXT_SCOPE"),
            ContextScope::PerTurn,
        );

        Self {
            port: parse_or("ASSISTANT_PORT", non_empty("ASSISTANT_PORT"), DEFAULT_PORT),
            controller: ControllerConfig {
                max_invalid_decisions,
                max_retrieval_rounds,
                context_scope,
                call_timeout: Duration::from_secs(timeout_secs.max(1)),
            },
            models: StepModels {
                decision: non_empty("DECISION_MODEL"),
                query: non_empty("QUERY_MODEL"),
                response: non_empty("RESPONSE_MODEL"),
            },
            retrieval_url: non_empty("RETRIEVAL_AGENT_URL"),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid setting, using default");
            default
        }
    }
}
