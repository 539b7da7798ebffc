//! Effects produced by state transitions

use super::{TaskDecision, TurnPhase};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append the user's message to the history
    RecordUserMessage { text: String },

    /// Forget the previous turn's decision and retrieval round count
    ResetTurn,

    /// Drop accumulated retrieval context
    ClearContext,

    /// Store the decision and the resulting invalid-decision count
    RecordDecision {
        decision: TaskDecision,
        invalid_decision_count: u32,
    },

    /// Concatenate a retrieval answer onto the accumulated context
    AppendContext { answer: String },

    /// Append the reply to the history
    RecordAssistantMessage { text: String },

    /// Run the decision step
    RequestDecision,

    /// Run query formulation and the retrieval agent
    RequestRetrieval,

    /// Run the response step
    RequestResponse,

    /// Reply with the fixed fallback text, no model call
    RespondWithFallback,

    /// Stop classifying; fed back as `Event::RetryBudgetExhausted`
    ExhaustRetryBudget,
}

impl Effect {
    /// Phase the state must be in for this effect to run.
    /// `None` for data effects, which are valid wherever a transition emits them.
    pub fn required_phase(&self) -> Option<TurnPhase> {
        match self {
            Effect::RequestDecision | Effect::ExhaustRetryBudget => Some(TurnPhase::Deciding),
            Effect::RequestRetrieval => Some(TurnPhase::Querying),
            Effect::RequestResponse => Some(TurnPhase::Responding { fallback: false }),
            Effect::RespondWithFallback => Some(TurnPhase::Responding { fallback: true }),
            _ => None,
        }
    }

    pub fn record_decision(decision: TaskDecision, invalid_decision_count: u32) -> Self {
        Effect::RecordDecision {
            decision,
            invalid_decision_count,
        }
    }
}
