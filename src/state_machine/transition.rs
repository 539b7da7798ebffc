//! Pure state transition function

use super::{ContextScope, ConversationState, Effect, Event, TaskDecision, TurnContext, TurnPhase};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: TurnPhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: TurnPhase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A turn is already in progress for this conversation")]
    AgentBusy,
    #[error("Retry budget of {max} invalid decisions already exhausted")]
    RetryBudgetExhausted { max: u32 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state, context and event it always produces the same
/// result, with no I/O. Data changes are expressed as effects.
pub fn transition(
    state: &ConversationState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let invalid_count = state.invalid_decision_count;
    let max_invalid = context.max_invalid_decisions;

    match (state.phase, event) {
        // ============================================================
        // Turn start
        // ============================================================

        // Idle/Done + UserMessage -> Deciding
        (TurnPhase::Idle | TurnPhase::Done, Event::UserMessage { text }) => {
            let clear = (context.context_scope == ContextScope::PerTurn)
                .then_some(Effect::ClearContext);

            Ok(TransitionResult::new(TurnPhase::Deciding)
                .with_effect(Effect::RecordUserMessage { text })
                .with_effect(Effect::ResetTurn)
                .with_effects(clear)
                .with_effect(Effect::RequestDecision))
        }

        // Mid-turn + UserMessage -> Reject
        (
            TurnPhase::Deciding | TurnPhase::Querying | TurnPhase::Responding { .. },
            Event::UserMessage { .. },
        ) => Err(TransitionError::AgentBusy),

        // ============================================================
        // Decision step
        // ============================================================
        (TurnPhase::Deciding, Event::Decided { .. }) if invalid_count >= max_invalid => {
            Err(TransitionError::RetryBudgetExhausted { max: max_invalid })
        }

        // Deciding + query -> Querying, unless this turn has used up its retrieval rounds
        (TurnPhase::Deciding, Event::Decided { decision: TaskDecision::Query })
            if state.retrieval_rounds < context.max_retrieval_rounds =>
        {
            Ok(TransitionResult::new(TurnPhase::Querying)
                .with_effect(Effect::record_decision(TaskDecision::Query, 0))
                .with_effect(Effect::RequestRetrieval))
        }

        (TurnPhase::Deciding, Event::Decided { decision: TaskDecision::Query }) => {
            Ok(TransitionResult::new(TurnPhase::Responding { fallback: false })
                .with_effect(Effect::record_decision(TaskDecision::Query, 0))
                .with_effect(Effect::RequestResponse))
        }

        // Deciding + respond -> Responding
        (TurnPhase::Deciding, Event::Decided { decision: TaskDecision::Respond }) => {
            Ok(TransitionResult::new(TurnPhase::Responding { fallback: false })
                .with_effect(Effect::record_decision(TaskDecision::Respond, 0))
                .with_effect(Effect::RequestResponse))
        }

        // Deciding + invalid -> Deciding, with one more attempt if budget remains
        (TurnPhase::Deciding, Event::Decided { decision: TaskDecision::Invalid }) => {
            let next_count = invalid_count + 1;
            let follow_up = if next_count < max_invalid {
                Effect::RequestDecision
            } else {
                Effect::ExhaustRetryBudget
            };

            Ok(TransitionResult::new(TurnPhase::Deciding)
                .with_effect(Effect::record_decision(TaskDecision::Invalid, next_count))
                .with_effect(follow_up))
        }

        // Deciding + budget exhausted -> Responding with fallback, counter reset
        (TurnPhase::Deciding, Event::RetryBudgetExhausted) if invalid_count >= max_invalid => {
            Ok(TransitionResult::new(TurnPhase::Responding { fallback: true })
                .with_effect(Effect::record_decision(TaskDecision::Invalid, 0))
                .with_effect(Effect::RespondWithFallback))
        }

        // ============================================================
        // Query formulation step
        // ============================================================

        // Querying + RetrievalComplete -> Deciding (always re-evaluate)
        (TurnPhase::Querying, Event::RetrievalComplete { answer }) => {
            Ok(TransitionResult::new(TurnPhase::Deciding)
                .with_effect(Effect::AppendContext { answer })
                .with_effect(Effect::RequestDecision))
        }

        // ============================================================
        // Response step
        // ============================================================
        (TurnPhase::Responding { .. }, Event::ResponseReady { text }) => {
            Ok(TransitionResult::new(TurnPhase::Done)
                .with_effect(Effect::RecordAssistantMessage { text }))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {phase} with event {}",
            event.name()
        ))),
    }
}
