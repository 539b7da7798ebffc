//! The three model-backed steps of a turn
//!
//! Each step reads the conversation state, makes its external calls under a
//! deadline and returns plain data. State changes happen only through the
//! effects the executor applies afterwards.

use super::error::{Step, TurnError};
use super::traits::{ModelInvoker, RetrievalAgent};
use crate::prompts::{PromptTemplate, PromptVariables, NO_CONTEXT_PLACEHOLDER, NO_DECISION_CONTEXT};
use crate::retrieval::AgentError;
use crate::state_machine::{ConversationState, TaskDecision, TurnContext};
use std::future::Future;
use std::time::Duration;

/// Reply used when the decision step keeps producing unusable output
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I could not determine how to proceed with your request. Please try rephrasing it.";

async fn bounded<T, F>(step: Step, after: Duration, call: F) -> Result<T, TurnError>
where
    F: Future<Output = Result<T, TurnError>>,
{
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| TurnError::Timeout { step, after })?
}

async fn call_model<M: ModelInvoker>(
    invoker: &M,
    step: Step,
    template: PromptTemplate,
    variables: PromptVariables,
    after: Duration,
) -> Result<String, TurnError> {
    bounded(step, after, async {
        invoker
            .complete(template, &variables)
            .await
            .map_err(|e| TurnError::model(step, e))
    })
    .await
}

fn latest_input(state: &ConversationState) -> Result<String, TurnError> {
    state
        .latest_user_message()
        .map(str::to_string)
        .ok_or(TurnError::NoUserMessage)
}

fn context_or(state: &ConversationState, placeholder: &str) -> String {
    if state.accumulated_context.is_empty() {
        placeholder.to_string()
    } else {
        state.accumulated_context.clone()
    }
}

/// Ask the model whether to query the retrieval agents or respond
pub async fn decide<M: ModelInvoker>(
    invoker: &M,
    state: &ConversationState,
    context: &TurnContext,
    after: Duration,
) -> Result<TaskDecision, TurnError> {
    let variables = PromptVariables::from([
        ("input", latest_input(state)?),
        ("invalid_count", state.invalid_decision_count.to_string()),
        ("max_invalid", context.max_invalid_decisions.to_string()),
        ("context", context_or(state, NO_DECISION_CONTEXT)),
    ]);

    let raw = call_model(invoker, Step::Decide, PromptTemplate::Decide, variables, after).await?;
    let decision = TaskDecision::parse(&raw);
    if decision == TaskDecision::Invalid {
        tracing::warn!(
            session_id = %context.session_id,
            output = %raw.trim(),
            "Decision output matched neither query nor respond"
        );
    }
    Ok(decision)
}

/// Formulate a retrieval query from the latest message and send it to the agent
pub async fn formulate_and_retrieve<M: ModelInvoker, R: RetrievalAgent>(
    invoker: &M,
    agent: &R,
    state: &ConversationState,
    after: Duration,
) -> Result<String, TurnError> {
    let input = latest_input(state)?;
    let formulated = call_model(
        invoker,
        Step::FormulateQuery,
        PromptTemplate::FormulateQuery,
        PromptVariables::from([("input", input.clone())]),
        after,
    )
    .await?;

    let query = match formulated.trim() {
        "" => input,
        trimmed => trimmed.to_string(),
    };
    tracing::debug!(query = %query, "Querying retrieval agent");

    let answer = bounded(Step::Retrieve, after, async {
        agent.query(&query).await.map_err(TurnError::from)
    })
    .await?;

    if answer.trim().is_empty() {
        return Err(AgentError::NoAnswer.into());
    }
    Ok(answer)
}

/// Produce the final reply from the latest message and gathered context
pub async fn respond<M: ModelInvoker>(
    invoker: &M,
    state: &ConversationState,
    after: Duration,
) -> Result<String, TurnError> {
    let variables = PromptVariables::from([
        ("input", latest_input(state)?),
        ("context", context_or(state, NO_CONTEXT_PLACEHOLDER)),
    ]);

    let reply = call_model(invoker, Step::Respond, PromptTemplate::Respond, variables, after).await?;
    if reply.trim().is_empty() {
        return Err(TurnError::model(
            Step::Respond,
            crate::llm::LlmError::unknown("Model returned an empty reply"),
        ));
    }
    Ok(reply)
}
