//! Events that drive a turn forward

use super::TaskDecision;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Host events
    UserMessage { text: String },

    // Decision step
    Decided { decision: TaskDecision },
    /// No classification attempts remain for this turn
    RetryBudgetExhausted,

    // Query formulation step
    RetrievalComplete { answer: String },

    // Response step
    ResponseReady { text: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::Decided { .. } => "decided",
            Event::RetryBudgetExhausted => "retry_budget_exhausted",
            Event::RetrievalComplete { .. } => "retrieval_complete",
            Event::ResponseReady { .. } => "response_ready",
        }
    }
}
