//! API request and response types

use crate::session::Session;
use crate::state_machine::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================
// Requests
// ============================================================

/// Request to create a new chat
#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to send a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Request to rename a chat
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: Option<String>,
}

// ============================================================
// Responses
// ============================================================

/// A chat with its full history
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for ChatResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            title: session.title,
            messages: session.state.messages,
            created_at: session.created_at,
        }
    }
}

/// The assistant's answer to a sent message
#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantMessageResponse {
    pub id: String,
    pub role: String,
    pub content: String,
}

impl AssistantMessageResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Model information for the client
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

// ============================================================
// Performance dashboard
// ============================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub overall_progress: u32,
    pub study_hours: u32,
    pub tasks_completed: u32,
    pub average_grade: f64,
    pub streak: u32,
    pub focus_score: u32,
    pub upcoming_deadlines: Vec<Deadline>,
    pub recent_achievements: Vec<String>,
    pub subject_performance: Vec<SubjectScore>,
    pub weekly_study_hours: Vec<DayHours>,
}

#[derive(Debug, Serialize)]
pub struct Deadline {
    pub task: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: u32,
}

#[derive(Debug, Serialize)]
pub struct DayHours {
    pub day: String,
    pub hours: u32,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
