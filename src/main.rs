//! Study Assistant - conversational assistant for students
//!
//! Each user message runs one turn of a small state machine: decide whether
//! to consult the external retrieval agents, optionally query them, then
//! compose the reply with an LLM.

mod api;
mod config;
mod controller;
mod llm;
mod prompts;
mod retrieval;
mod session;
mod state_machine;

use api::{create_router, AppState};
use config::AssistantConfig;
use controller::{ModelInvoker, RegistryModelInvoker, RetrievalAgent, TurnController};
use llm::{all_models, LlmConfig, ModelRegistry};
use retrieval::{HttpRetrievalAgent, UnconfiguredRetrievalAgent};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AssistantConfig::from_env();
    tracing::info!(
        max_invalid_decisions = config.controller.max_invalid_decisions,
        max_retrieval_rounds = config.controller.max_retrieval_rounds,
        call_timeout_secs = config.controller.call_timeout.as_secs(),
        context_scope = ?config.controller.context_scope,
        "Turn controller configured"
    );

    // Initialize LLM registry
    let llm_config = LlmConfig::from_env();
    let llm_registry = Arc::new(ModelRegistry::new(&llm_config));

    if llm_registry.has_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model_id(),
            "LLM registry initialized"
        );
    } else {
        let mut key_vars: Vec<_> = all_models()
            .iter()
            .map(|m| m.provider.api_key_env_var())
            .collect();
        key_vars.dedup();
        tracing::warn!(
            "No LLM API keys configured. Set {} or LLM_GATEWAY.",
            key_vars.join(" or ")
        );
    }

    // Retrieval agent
    let agent: Arc<dyn RetrievalAgent> = match &config.retrieval_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP retrieval agent");
            Arc::new(HttpRetrievalAgent::new(url.as_str())?)
        }
        None => {
            tracing::warn!("RETRIEVAL_AGENT_URL not set; turns that need retrieval will fail");
            Arc::new(UnconfiguredRetrievalAgent)
        }
    };

    let invoker: Arc<dyn ModelInvoker> = Arc::new(RegistryModelInvoker::new(
        llm_registry.clone(),
        config.models.clone(),
    ));
    let controller = TurnController::new(invoker, agent, config.controller.clone());

    // Create application state
    let state = AppState::new(controller, llm_registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Study assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
