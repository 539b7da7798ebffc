//! Turn controller
//!
//! Drives one user turn through the decision, query formulation and
//! response steps, carrying state between turns of a session.

mod error;
mod executor;
mod steps;
mod traits;

#[cfg(test)]
pub mod testing;

pub use error::TurnError;
pub use executor::TurnController;
pub use traits::*;

use crate::state_machine::state::{DEFAULT_MAX_INVALID_DECISIONS, DEFAULT_MAX_RETRIEVAL_ROUNDS};
use crate::state_machine::ContextScope;
use std::sync::Arc;
use std::time::Duration;

/// Controller used by the HTTP host, with boxed collaborators
pub type SharedController = TurnController<Arc<dyn ModelInvoker>, Arc<dyn RetrievalAgent>>;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Tuning for every turn the controller runs
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Invalid decisions tolerated before the fallback reply (at least 1)
    pub max_invalid_decisions: u32,
    pub max_retrieval_rounds: u32,
    pub context_scope: ContextScope,
    /// Deadline for each model or retrieval call
    pub call_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_invalid_decisions: DEFAULT_MAX_INVALID_DECISIONS,
            max_retrieval_rounds: DEFAULT_MAX_RETRIEVAL_ROUNDS,
            context_scope: ContextScope::PerTurn,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}
