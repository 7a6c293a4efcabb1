use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Business, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Queued,
    Running,
    Completed,
    Error,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Error | SessionStatus::Cancelled
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionStatus::Queued => "queued",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// The mutable record of one extraction job. Only the session's own
/// orchestrator task mutates it; everyone else reads snapshots.
#[derive(Debug)]
pub struct SessionState {
    pub id: Uuid,
    pub query: SearchQuery,
    pub status: SessionStatus,
    pub completed: usize,
    pub total: usize,
    pub records: Vec<Business>,
    pub error_message: Option<String>,
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(id: Uuid, query: SearchQuery) -> Self {
        Self {
            id,
            query,
            status: SessionStatus::Queued,
            completed: 0,
            // Unknown until the source has been enumerated.
            total: 0,
            records: Vec::new(),
            error_message: None,
            cancel_requested: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn mark_running(&mut self) {
        if self.status == SessionStatus::Queued {
            self.status = SessionStatus::Running;
        }
    }

    /// Fixes `total` to min(available, max_results). Assigned once; later
    /// calls are ignored so the count is never raised after being set.
    pub fn set_total(&mut self, available: usize) {
        if self.total == 0 {
            self.total = available.min(self.query.max_results);
        }
    }

    /// Appends a record and bumps the completed count in one step, so a
    /// reader holding the lock never sees one without the other.
    pub fn push_record(&mut self, record: Business) {
        self.records.push(record);
        self.completed += 1;
    }

    pub fn complete(&mut self) {
        self.finish(SessionStatus::Completed, None);
    }

    pub fn fail(&mut self, message: String) {
        self.finish(SessionStatus::Error, Some(message));
    }

    pub fn cancel(&mut self) {
        self.finish(SessionStatus::Cancelled, None);
    }

    fn finish(&mut self, status: SessionStatus, message: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.error_message = message;
        self.completed_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            query: self.query.clone(),
            status: self.status,
            completed: self.completed,
            total: self.total,
            records: self.records.clone(),
            error_message: self.error_message.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            keywords: self.query.keywords.clone(),
            location: self.query.location.clone(),
            status: self.status,
            completed: self.completed,
            total: self.total,
            created_at: self.created_at,
        }
    }
}

/// A consistent point-in-time copy of a session, safe to hold after the
/// registry lock is released.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub query: SearchQuery,
    pub status: SessionStatus,
    pub completed: usize,
    pub total: usize,
    pub records: Vec<Business>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn progress_percentage(&self) -> f64 {
        if self.total > 0 {
            self.completed as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub keywords: String,
    pub location: String,
    pub status: SessionStatus,
    pub completed: usize,
    pub total: usize,
    pub created_at: DateTime<Utc>,
}
