//! HTTP API for the study assistant

mod handlers;
mod types;

pub use handlers::create_router;

use crate::controller::SharedController;
use crate::llm::ModelRegistry;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub controller: Arc<SharedController>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(controller: SharedController, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            controller: Arc::new(controller),
            llm_registry,
        }
    }
}
