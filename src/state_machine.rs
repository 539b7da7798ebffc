//! Turn state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` maps (state, event) to a new phase plus effects, and the
//! controller executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ChatMessage, ContextScope, ConversationState, TaskDecision, TurnContext, TurnPhase};
pub use transition::{transition, TransitionError};
