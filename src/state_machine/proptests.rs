//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::TransitionResult;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn context_with_budget(max_invalid_decisions: u32, max_retrieval_rounds: u32) -> TurnContext {
    TurnContext {
        max_invalid_decisions,
        max_retrieval_rounds,
        ..TurnContext::new("prop-session")
    }
}

fn apply(state: &mut ConversationState, result: &TransitionResult) {
    state.phase = result.new_phase;
    for effect in &result.effects {
        state.apply_effect(effect);
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_phase() -> impl Strategy<Value = TurnPhase> {
    prop_oneof![
        Just(TurnPhase::Idle),
        Just(TurnPhase::Deciding),
        Just(TurnPhase::Querying),
        any::<bool>().prop_map(|fallback| TurnPhase::Responding { fallback }),
        Just(TurnPhase::Done),
    ]
}

fn arb_decision() -> impl Strategy<Value = TaskDecision> {
    prop_oneof![
        Just(TaskDecision::Query),
        Just(TaskDecision::Respond),
        Just(TaskDecision::Invalid),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ?]{1,30}".prop_map(|text| Event::UserMessage { text }),
        arb_decision().prop_map(|decision| Event::Decided { decision }),
        Just(Event::RetryBudgetExhausted),
        "[a-zA-Z ]{1,30}".prop_map(|answer| Event::RetrievalComplete { answer }),
        "[a-zA-Z ]{1,30}".prop_map(|text| Event::ResponseReady { text }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Below the budget an invalid decision loops back and counts exactly one more
    #[test]
    fn invalid_decision_increments_by_one(max in 1u32..20, seed in 0u32..20) {
        let count = seed % max;
        let context = context_with_budget(max, 5);
        let state = ConversationState {
            phase: TurnPhase::Deciding,
            invalid_decision_count: count,
            ..ConversationState::default()
        };

        let result = transition(&state, &context, Event::Decided { decision: TaskDecision::Invalid }).unwrap();
        let mut next = state.clone();
        apply(&mut next, &result);

        prop_assert_eq!(next.phase, TurnPhase::Deciding);
        prop_assert_eq!(next.invalid_decision_count, count + 1);
    }

    /// A completed retrieval always returns control to the decision step
    #[test]
    fn retrieval_always_returns_to_deciding(answer in "[a-zA-Z ]{1,40}", rounds in 0u32..10) {
        let state = ConversationState {
            phase: TurnPhase::Querying,
            retrieval_rounds: rounds,
            ..ConversationState::default()
        };

        let result = transition(&state, &context_with_budget(10, 5), Event::RetrievalComplete { answer }).unwrap();
        prop_assert_eq!(result.new_phase, TurnPhase::Deciding);
    }

    /// Whatever the sequence of events, the invalid count never exceeds the budget
    #[test]
    fn invalid_count_bounded(
        max in 1u32..6,
        events in proptest::collection::vec(arb_event(), 0..60),
    ) {
        let context = context_with_budget(max, 3);
        let mut state = ConversationState::default();

        for event in events {
            if let Ok(result) = transition(&state, &context, event) {
                apply(&mut state, &result);
            }
            prop_assert!(state.invalid_decision_count <= max);
            prop_assert!(state.retrieval_rounds <= 3);
        }
    }

    /// Only idle and done phases accept a new user message
    #[test]
    fn user_message_only_between_turns(phase in arb_phase(), text in "[a-z ]{1,20}") {
        let state = ConversationState { phase, ..ConversationState::default() };
        let result = transition(&state, &context_with_budget(10, 5), Event::UserMessage { text });

        if phase.accepts_user_message() {
            prop_assert_eq!(result.unwrap().new_phase, TurnPhase::Deciding);
        } else {
            prop_assert!(matches!(result, Err(TransitionError::AgentBusy)));
        }
    }

    /// The querying phase never jumps straight to a reply
    #[test]
    fn querying_never_reaches_responding(event in arb_event()) {
        let state = ConversationState { phase: TurnPhase::Querying, ..ConversationState::default() };
        if let Ok(result) = transition(&state, &context_with_budget(10, 5), event) {
            let replied = matches!(result.new_phase, TurnPhase::Responding { .. } | TurnPhase::Done);
            prop_assert!(!replied, "querying moved to {}", result.new_phase);
        }
    }

    /// The transition function is deterministic
    #[test]
    fn transition_is_pure(phase in arb_phase(), event in arb_event(), count in 0u32..12) {
        let state = ConversationState {
            phase,
            invalid_decision_count: count,
            ..ConversationState::default()
        };
        let context = context_with_budget(10, 5);

        let first = transition(&state, &context, event.clone());
        let second = transition(&state, &context, event);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_phase, b.new_phase);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "transition results diverged"),
        }
    }
}
