//! Turn executor

use super::error::TurnError;
use super::steps::{self, FALLBACK_REPLY};
use super::traits::{ModelInvoker, RetrievalAgent};
use super::ControllerConfig;
use crate::state_machine::{
    transition, ConversationState, Effect, Event, TransitionError, TurnContext, TurnPhase,
};

/// Runs turns against any model and retrieval implementation
pub struct TurnController<M, R>
where
    M: ModelInvoker,
    R: RetrievalAgent,
{
    invoker: M,
    agent: R,
    config: ControllerConfig,
}

impl<M, R> TurnController<M, R>
where
    M: ModelInvoker,
    R: RetrievalAgent,
{
    pub fn new(invoker: M, agent: R, config: ControllerConfig) -> Self {
        Self {
            invoker,
            agent,
            config,
        }
    }

    pub fn turn_context(&self, session_id: &str) -> TurnContext {
        TurnContext {
            session_id: session_id.to_string(),
            max_invalid_decisions: self.config.max_invalid_decisions.max(1),
            max_retrieval_rounds: self.config.max_retrieval_rounds,
            context_scope: self.config.context_scope,
        }
    }

    /// Run one full turn for `text` and return the assistant's reply.
    ///
    /// The turn runs on a working copy that replaces `state` only on success.
    /// A failed or cancelled turn leaves `state` untouched, so the host may
    /// retry the same message.
    pub async fn invoke(
        &self,
        session_id: &str,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<String, TurnError> {
        let context = self.turn_context(session_id);
        let mut working = state.clone();
        let start = std::time::Instant::now();

        match self.run_turn(&context, &mut working, text).await {
            Ok(reply) => {
                tracing::info!(
                    session_id = %session_id,
                    duration_ms = %start.elapsed().as_millis(),
                    decision = ?working.task_decision,
                    retrieval_rounds = working.retrieval_rounds,
                    "Turn completed"
                );
                *state = working;
                Ok(reply)
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    phase = %working.phase,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Turn failed, conversation state left unchanged"
                );
                Err(e)
            }
        }
    }

    async fn run_turn(
        &self,
        context: &TurnContext,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<String, TurnError> {
        self.process_event(
            context,
            state,
            Event::UserMessage {
                text: text.to_string(),
            },
        )
        .await?;

        match (state.phase, state.last_reply()) {
            (TurnPhase::Done, Some(reply)) => Ok(reply.to_string()),
            (phase, _) => Err(TransitionError::InvalidTransition(format!(
                "Turn stopped in phase {phase} without a reply"
            ))
            .into()),
        }
    }

    async fn process_event(
        &self,
        context: &TurnContext,
        state: &mut ConversationState,
        event: Event,
    ) -> Result<(), TurnError> {
        // Effects may generate follow-up events; handle them in a loop
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = transition(state, context, current_event)?;

            tracing::debug!(
                session_id = %context.session_id,
                event = event_name,
                from = %state.phase,
                to = %result.new_phase,
                "Transition"
            );
            state.phase = result.new_phase;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(context, state, effect).await? {
                    events_to_process.push(generated);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(
        &self,
        context: &TurnContext,
        state: &mut ConversationState,
        effect: Effect,
    ) -> Result<Option<Event>, TurnError> {
        if let Some(required) = effect.required_phase() {
            if state.phase != required {
                return Err(TransitionError::InvalidTransition(format!(
                    "Effect {effect:?} requires phase {required}, but state is {}",
                    state.phase
                ))
                .into());
            }
        }

        let timeout = self.config.call_timeout;
        match effect {
            Effect::RequestDecision => {
                let decision = steps::decide(&self.invoker, state, context, timeout).await?;
                tracing::info!(
                    session_id = %context.session_id,
                    decision = %decision,
                    invalid_count = state.invalid_decision_count,
                    "Decision made"
                );
                Ok(Some(Event::Decided { decision }))
            }

            Effect::RequestRetrieval => {
                let answer =
                    steps::formulate_and_retrieve(&self.invoker, &self.agent, state, timeout)
                        .await?;
                tracing::info!(
                    session_id = %context.session_id,
                    round = state.retrieval_rounds + 1,
                    answer_len = answer.len(),
                    "Retrieval complete"
                );
                Ok(Some(Event::RetrievalComplete { answer }))
            }

            Effect::RequestResponse => {
                let text = steps::respond(&self.invoker, state, timeout).await?;
                Ok(Some(Event::ResponseReady { text }))
            }

            Effect::RespondWithFallback => Ok(Some(Event::ResponseReady {
                text: FALLBACK_REPLY.to_string(),
            })),

            Effect::ExhaustRetryBudget => {
                tracing::warn!(
                    session_id = %context.session_id,
                    max = context.max_invalid_decisions,
                    "Invalid decision budget exhausted, replying with fallback"
                );
                Ok(Some(Event::RetryBudgetExhausted))
            }

            data => {
                state.apply_effect(&data);
                Ok(None)
            }
        }
    }
}
