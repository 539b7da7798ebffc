//! Turn-level errors surfaced to the host

use crate::llm::LlmError;
use crate::retrieval::AgentError;
use crate::state_machine::TransitionError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External call made during a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Decide,
    FormulateQuery,
    Retrieve,
    Respond,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Decide => "decision",
            Step::FormulateQuery => "query formulation",
            Step::Retrieve => "retrieval",
            Step::Respond => "response",
        })
    }
}

/// Why a turn failed. The conversation state is left as it was before the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Model call in {step} step failed: {source}")]
    Model {
        step: Step,
        #[source]
        source: LlmError,
    },
    #[error(transparent)]
    Retrieval(#[from] AgentError),
    #[error("{step} step timed out after {after:?}")]
    Timeout { step: Step, after: Duration },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Conversation has no user message to act on")]
    NoUserMessage,
}

impl TurnError {
    pub fn model(step: Step, source: LlmError) -> Self {
        TurnError::Model { step, source }
    }

    /// Provider-requested delay before retrying, when one was given
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TurnError::Model { source, .. } => source.retry_after,
            _ => None,
        }
    }

    /// Whether the host may reasonably retry the same message
    pub fn is_retryable(&self) -> bool {
        match self {
            TurnError::Model { source, .. } => source.kind.is_retryable(),
            TurnError::Retrieval(e) => e.is_retryable(),
            TurnError::Timeout { .. } => true,
            TurnError::Transition(_) | TurnError::NoUserMessage => false,
        }
    }
}
