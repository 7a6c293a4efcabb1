use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::SearchQuery;
use crate::session::state::{SessionSnapshot, SessionState, SessionSummary};

pub type SharedSession = Arc<RwLock<SessionState>>;

/// Process-wide table of extraction sessions. Creation never blocks on the
/// extraction itself; readers get consistent snapshots while the owning
/// orchestrator task writes. Sessions are kept for the process lifetime.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn create(&self, query: SearchQuery) -> Uuid {
        let id = Uuid::new_v4();
        let session = Arc::new(RwLock::new(SessionState::new(id, query)));
        self.sessions.write().await.insert(id, session);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn snapshot(&self, id: &Uuid) -> Option<SessionSnapshot> {
        let session = self.get(id).await?;
        let state = session.read().await;
        Some(state.snapshot())
    }

    /// Summaries of every session, newest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            summaries.push(session.read().await.summary());
        }
        drop(sessions);
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Flags a session for cooperative cancellation. Returns `None` for an
    /// unknown id, `Some(false)` if the session already finished, and
    /// `Some(true)` once the flag is set.
    pub async fn request_cancel(&self, id: &Uuid) -> Option<bool> {
        let session = self.get(id).await?;
        let mut state = session.write().await;
        if state.status.is_terminal() {
            return Some(false);
        }
        state.cancel_requested = true;
        Some(true)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
