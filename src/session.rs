//! In-process session store
//!
//! Each chat owns one `ConversationState`. The state sits behind its own
//! async mutex so turns on the same chat run one at a time while different
//! chats proceed independently. Readers see the copy published when the
//! last lock holder released it, and never wait on a turn.

use crate::state_machine::ConversationState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, MutexGuard, RwLock};

pub const DEFAULT_TITLE: &str = "New Chat";

/// A chat and its conversation state
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub state: ConversationState,
}

impl Session {
    fn new(title: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            created_at: Utc::now(),
            state: ConversationState::new(),
        }
    }

    /// Forget the history and every turn counter
    pub fn clear(&mut self) {
        self.state = ConversationState::new();
    }
}

/// One chat: the live session plus its last published copy
#[derive(Debug)]
pub struct SessionSlot {
    live: Mutex<Session>,
    committed: std::sync::RwLock<Session>,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            committed: std::sync::RwLock::new(session.clone()),
            live: Mutex::new(session),
        }
    }

    /// Exclusive access for a turn or an edit. Changes become visible to
    /// readers when the guard is dropped.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            session: self.live.lock().await,
            committed: &self.committed,
        }
    }

    /// Last published copy
    pub fn committed(&self) -> Session {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Locked session; publishes its state on drop
pub struct SessionGuard<'a> {
    session: MutexGuard<'a, Session>,
    committed: &'a std::sync::RwLock<Session>,
}

impl Deref for SessionGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = self.session.clone();
    }
}

pub type SessionHandle = Arc<SessionSlot>;

/// Sessions keyed by chat id
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session; a missing or blank title becomes the default
    pub async fn create(&self, title: Option<String>) -> Session {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let session = Session::new(title);

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), Arc::new(SessionSlot::new(session.clone())));
        tracing::info!(session_id = %session.id, title = %session.title, "Session created");
        session
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Last published copy of one session
    pub async fn snapshot(&self, id: &str) -> Option<Session> {
        Some(self.get(id).await?.committed())
    }

    /// Last published copies of every session, oldest first
    pub async fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .map(|slot| slot.committed())
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    pub async fn rename(&self, id: &str, title: String) -> Option<Session> {
        let handle = self.get(id).await?;
        let mut session = handle.lock().await;
        session.title = title;
        Some(Session::clone(&session))
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session deleted");
        }
        removed
    }
}
