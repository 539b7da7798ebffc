//! HTTP request handlers

use super::types::{
    AssistantMessageResponse, ChatResponse, CreateChatRequest, DayHours, Deadline, ErrorResponse,
    MessageResponse, ModelInfo, ModelsResponse, PerformanceResponse, RenameRequest,
    SendMessageRequest, SubjectScore,
};
use super::AppState;
use crate::controller::TurnError;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use rand::Rng;

const CLEAR_COMMAND: &str = "/clear";
const CLEARED_REPLY: &str = "Chat history cleared.";
const UNKNOWN_COMMAND_REPLY: &str = "Command not recognized.";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat management
        .route("/chats", get(list_chats).post(create_chat))
        .route("/chats/:id", get(get_chat).delete(delete_chat))
        .route("/chats/:id/title", patch(rename_chat))
        // Conversation turns
        .route("/chats/:id/messages", post(send_message))
        // Dashboard feed
        .route("/performance", get(get_performance))
        // Model info
        .route("/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat Management
// ============================================================

async fn list_chats(State(state): State<AppState>) -> Json<Vec<ChatResponse>> {
    let chats = state
        .sessions
        .list()
        .await
        .into_iter()
        .map(ChatResponse::from)
        .collect();
    Json(chats)
}

async fn create_chat(
    State(state): State<AppState>,
    body: Option<Json<CreateChatRequest>>,
) -> Json<ChatResponse> {
    let title = body.and_then(|Json(req)| req.title);
    Json(state.sessions.create(title).await.into())
}

async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, AppError> {
    let session = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or(AppError::ChatNotFound)?;
    Ok(Json(session.into()))
}

async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.sessions.delete(&id).await {
        return Err(AppError::ChatNotFound);
    }
    Ok(Json(MessageResponse {
        message: "Chat deleted successfully".to_string(),
    }))
}

async fn rename_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if state.sessions.get(&id).await.is_none() {
        return Err(AppError::ChatNotFound);
    }
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;

    let session = state
        .sessions
        .rename(&id, title)
        .await
        .ok_or(AppError::ChatNotFound)?;
    Ok(Json(session.into()))
}

// ============================================================
// Conversation Turns
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<AssistantMessageResponse>, AppError> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or(AppError::ChatNotFound)?;
    let content = req
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Message content is required".to_string()))?;

    // Held for the whole turn: one turn per chat at a time
    let mut session = handle.lock().await;

    if content.starts_with('/') {
        let reply = if content.trim() == CLEAR_COMMAND {
            session.clear();
            tracing::info!(session_id = %id, "Chat history cleared");
            CLEARED_REPLY
        } else {
            UNKNOWN_COMMAND_REPLY
        };
        return Ok(Json(AssistantMessageResponse::new(reply)));
    }

    let reply = state
        .controller
        .invoke(&id, &mut session.state, &content)
        .await?;

    let message_id = session
        .state
        .messages
        .last()
        .map(|m| m.id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    Ok(Json(AssistantMessageResponse {
        id: message_id,
        ..AssistantMessageResponse::new(reply)
    }))
}

// ============================================================
// Dashboard & Info
// ============================================================

async fn get_performance() -> Json<PerformanceResponse> {
    let today = Local::now().date_naive();
    Json(mock_performance(&mut rand::thread_rng(), today))
}

/// Randomized study metrics for the dashboard
fn mock_performance(rng: &mut impl Rng, today: NaiveDate) -> PerformanceResponse {
    let deadline = |task: &str, days: i64| Deadline {
        task: task.to_string(),
        date: (today + chrono::Duration::days(days))
            .format("%Y-%m-%d")
            .to_string(),
    };

    let subject_performance = ["Math", "Science", "History", "English", "Art"]
        .into_iter()
        .map(|subject| SubjectScore {
            subject: subject.to_string(),
            score: rng.gen_range(70..=100),
        })
        .collect();

    let weekly_study_hours = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
        .into_iter()
        .map(|day| DayHours {
            day: day.to_string(),
            hours: rng.gen_range(1..=6),
        })
        .collect();

    PerformanceResponse {
        overall_progress: rng.gen_range(60..=95),
        study_hours: rng.gen_range(20..=40),
        tasks_completed: rng.gen_range(10..=30),
        average_grade: (rng.gen_range(70.0..=95.0_f64) * 100.0).round() / 100.0,
        streak: rng.gen_range(1..=14),
        focus_score: rng.gen_range(60..=100),
        upcoming_deadlines: vec![
            deadline("Math Assignment", 2),
            deadline("History Essay", 5),
            deadline("Science Project", 7),
        ],
        recent_achievements: vec![
            "Completed 7-day study streak".to_string(),
            "Improved average grade by 5%".to_string(),
            "Finished all tasks for the week".to_string(),
        ],
        subject_performance,
        weekly_study_hours,
    }
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state
        .llm_registry
        .available_model_defs()
        .into_iter()
        .map(|def| ModelInfo {
            id: def.id.to_string(),
            provider: def.provider.display_name().to_string(),
            description: def.description.to_string(),
        })
        .collect();

    Json(ModelsResponse {
        models,
        default: state.llm_registry.default_model_id().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("study-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    ChatNotFound,
    Turn(TurnError),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        AppError::Turn(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ChatNotFound => (StatusCode::NOT_FOUND, "Chat not found".to_string()),
            AppError::Turn(e) => {
                let status = if e.is_retryable() {
                    retry_after = e.retry_after();
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, format!("Error processing message: {e}"))
            }
        };

        let body = Json(ErrorResponse::new(message));
        let mut response = (status, body).into_response();
        if let Some(delay) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(delay.as_secs()));
        }
        response
    }
}
