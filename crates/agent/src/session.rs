//! Per-session conversation state for the travel planner.
//!
//! Each session owns its trip summary and Q&A history behind its own async
//! mutex, so one session's follow-up questions are serialized while other
//! sessions proceed independently. Nothing here is persisted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::assistants::travel::TripPlan;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One answered follow-up question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QnaPair {
    pub question: String,
    pub answer: String,
}

/// State carried across one user's interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: SessionId,
    /// Trip facts from the last successful plan; `None` until then.
    pub trip_summary: Option<String>,
    pub plan: Option<TripPlan>,
    /// Oldest first, append-only.
    pub qna_history: Vec<QnaPair>,
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            trip_summary: None,
            plan: None,
            qna_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Store a completed plan. A re-submission overwrites the summary but
    /// keeps earlier answers.
    pub fn record_trip(&mut self, summary: String, plan: TripPlan) {
        self.trip_summary = Some(summary);
        self.plan = Some(plan);
    }

    pub fn push_answer(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.qna_history.push(QnaPair {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn has_trip(&self) -> bool {
        self.trip_summary.is_some()
    }
}

pub type SharedSession = Arc<Mutex<SessionContext>>;

/// In-memory map of live sessions.
///
/// Capped at `max_sessions`; creating one more evicts the oldest.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    order: Mutex<Vec<SessionId>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn create(&self) -> SessionId {
        let id = SessionId::new();
        let mut order = self.order.lock().await;
        let mut sessions = self.sessions.write().await;

        while sessions.len() >= self.max_sessions && !order.is_empty() {
            let oldest = order.remove(0);
            sessions.remove(&oldest);
            debug!(session = %oldest, "Evicted oldest session");
        }

        sessions.insert(id, Arc::new(Mutex::new(SessionContext::new(id))));
        order.push(id);
        debug!(session = %id, live = sessions.len(), "Session created");
        id
    }

    pub async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub async fn end(&self, id: &SessionId) -> bool {
        let mut order = self.order.lock().await;
        let removed = self.sessions.write().await.remove(id).is_some();
        order.retain(|s| s != id);
        if removed {
            debug!(session = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::default();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a, b);

        store
            .get(&a)
            .await
            .unwrap()
            .lock()
            .await
            .push_answer("q", "answer for a");

        let session_b = store.get(&b).await.unwrap();
        assert!(session_b.lock().await.qna_history.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn end_discards_state() {
        let store = SessionStore::default();
        let id = store.create().await;
        assert!(store.end(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.end(&id).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn oldest_session_evicted_at_capacity() {
        let store = SessionStore::new(2);
        let first = store.create().await;
        let second = store.create().await;
        let third = store.create().await;

        assert!(store.get(&first).await.is_none());
        assert!(store.get(&second).await.is_some());
        assert!(store.get(&third).await.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn history_keeps_submission_order() {
        let mut ctx = SessionContext::new(SessionId::new());
        for (q, a) in [("one", "1"), ("two", "2"), ("three", "3")] {
            ctx.push_answer(q, a);
        }
        let questions: Vec<_> = ctx.qna_history.iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["one", "two", "three"]);
        assert!(!ctx.has_trip());
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
