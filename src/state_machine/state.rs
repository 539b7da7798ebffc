//! Conversation state types

use super::Effect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Decision
// ============================================================================

/// Outcome of the decision step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDecision {
    /// Consult the retrieval agent first
    Query,
    /// Answer directly
    Respond,
    /// The model output matched neither token
    Invalid,
}

impl TaskDecision {
    /// Classify raw model output.
    ///
    /// Surrounding whitespace and punctuation are stripped and the rest is
    /// lower-cased, then matched by prefix against `query` and `respond`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .to_lowercase();

        if normalized.starts_with("query") {
            TaskDecision::Query
        } else if normalized.starts_with("respond") {
            TaskDecision::Respond
        } else {
            TaskDecision::Invalid
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskDecision::Query => "query",
            TaskDecision::Respond => "respond",
            TaskDecision::Invalid => "invalid",
        }
    }
}

impl fmt::Display for TaskDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Turn Phase
// ============================================================================

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnPhase {
    /// Session created, no turn taken yet
    #[default]
    Idle,
    /// Waiting on the decision step
    Deciding,
    /// Waiting on query formulation and retrieval
    Querying,
    /// Waiting on the reply; `fallback` replies without a model call
    Responding { fallback: bool },
    /// Turn finished, ready for the next user message
    Done,
}

impl TurnPhase {
    pub fn name(self) -> &'static str {
        match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Deciding => "deciding",
            TurnPhase::Querying => "querying",
            TurnPhase::Responding { .. } => "responding",
            TurnPhase::Done => "done",
        }
    }

    /// Whether a new user message may start a turn
    pub fn accepts_user_message(self) -> bool {
        matches!(self, TurnPhase::Idle | TurnPhase::Done)
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Per-session state carried across turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Append-only, chronological
    pub messages: Vec<ChatMessage>,
    /// Retrieval answers gathered so far, concatenated in order
    pub accumulated_context: String,
    /// Latest decision-step outcome
    pub task_decision: Option<TaskDecision>,
    /// Consecutive invalid decisions; reset by a valid decision or a fallback
    pub invalid_decision_count: u32,
    /// Retrieval rounds completed in the current turn
    pub retrieval_rounds: u32,
    pub phase: TurnPhase,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the most recent user message
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Text of the most recent assistant message
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Apply a data effect. Effects that need I/O are left to the
    /// controller and ignored here.
    pub fn apply_effect(&mut self, effect: &Effect) {
        match effect {
            Effect::RecordUserMessage { text } => {
                self.messages.push(ChatMessage::new(Role::User, text.clone()));
            }
            Effect::ResetTurn => {
                self.task_decision = None;
                self.retrieval_rounds = 0;
            }
            Effect::ClearContext => self.accumulated_context.clear(),
            Effect::RecordDecision {
                decision,
                invalid_decision_count,
            } => {
                self.task_decision = Some(*decision);
                self.invalid_decision_count = *invalid_decision_count;
            }
            Effect::AppendContext { answer } => {
                self.accumulated_context.push_str(answer);
                self.retrieval_rounds += 1;
            }
            Effect::RecordAssistantMessage { text } => {
                self.messages
                    .push(ChatMessage::new(Role::Assistant, text.clone()));
            }
            Effect::RequestDecision
            | Effect::RequestRetrieval
            | Effect::RequestResponse
            | Effect::RespondWithFallback
            | Effect::ExhaustRetryBudget => {}
        }
    }
}

// ============================================================================
// Turn Context
// ============================================================================

/// Whether retrieval context survives into the next turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextScope {
    /// Cleared when a new user message starts a turn
    #[default]
    PerTurn,
    /// Kept for the lifetime of the session
    Conversation,
}

impl FromStr for ContextScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "turn" | "per_turn" | "per-turn" => Ok(ContextScope::PerTurn),
            "conversation" | "session" => Ok(ContextScope::Conversation),
            other => Err(format!("unknown context scope '{other}'")),
        }
    }
}

/// Immutable configuration for one session's turns
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    /// Invalid decisions tolerated before the fallback reply
    pub max_invalid_decisions: u32,
    /// Retrieval rounds allowed per turn before a `query` decision is
    /// routed to the response step
    pub max_retrieval_rounds: u32,
    pub context_scope: ContextScope,
}

pub const DEFAULT_MAX_INVALID_DECISIONS: u32 = 10;
pub const DEFAULT_MAX_RETRIEVAL_ROUNDS: u32 = 5;

impl TurnContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            max_invalid_decisions: DEFAULT_MAX_INVALID_DECISIONS,
            max_retrieval_rounds: DEFAULT_MAX_RETRIEVAL_ROUNDS,
            context_scope: ContextScope::PerTurn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_tokens() {
        assert_eq!(TaskDecision::parse("query"), TaskDecision::Query);
        assert_eq!(TaskDecision::parse("respond"), TaskDecision::Respond);
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(TaskDecision::parse("  Query.\n"), TaskDecision::Query);
        assert_eq!(TaskDecision::parse("'RESPOND'"), TaskDecision::Respond);
        assert_eq!(TaskDecision::parse("**respond**"), TaskDecision::Respond);
        assert_eq!(TaskDecision::parse("{query}"), TaskDecision::Query);
    }

    #[test]
    fn test_parse_prefix_match() {
        assert_eq!(
            TaskDecision::parse("respond - the answer is simple"),
            TaskDecision::Respond
        );
        assert_eq!(TaskDecision::parse("querying the agents"), TaskDecision::Query);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(TaskDecision::parse("Hmm not sure"), TaskDecision::Invalid);
        assert_eq!(TaskDecision::parse(""), TaskDecision::Invalid);
        assert_eq!(
            TaskDecision::parse("I would respond directly"),
            TaskDecision::Invalid
        );
    }

    #[test]
    fn test_context_scope_from_str() {
        assert_eq!("turn".parse(), Ok(ContextScope::PerTurn));
        assert_eq!(" Conversation ".parse(), Ok(ContextScope::Conversation));
        assert!("forever".parse::<ContextScope>().is_err());
    }

    #[test]
    fn test_apply_append_context_concatenates() {
        let mut state = ConversationState::new();
        state.apply_effect(&Effect::AppendContext {
            answer: "first".to_string(),
        });
        state.apply_effect(&Effect::AppendContext {
            answer: "second".to_string(),
        });
        assert_eq!(state.accumulated_context, "firstsecond");
        assert_eq!(state.retrieval_rounds, 2);
    }

    #[test]
    fn test_latest_user_message_and_reply() {
        let mut state = ConversationState::new();
        assert!(state.latest_user_message().is_none());
        state.apply_effect(&Effect::RecordUserMessage {
            text: "hi".to_string(),
        });
        assert_eq!(state.latest_user_message(), Some("hi"));
        assert!(state.last_reply().is_none());
        state.apply_effect(&Effect::RecordAssistantMessage {
            text: "hello".to_string(),
        });
        assert_eq!(state.last_reply(), Some("hello"));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(TurnPhase::Responding { fallback: true }.name(), "responding");
        assert!(TurnPhase::Idle.accepts_user_message());
        assert!(TurnPhase::Done.accepts_user_message());
        assert!(!TurnPhase::Querying.accepts_user_message());
    }
}
