// src/quiz/store.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::QuizSession;
use crate::error::AppError;

struct SessionEntry {
    session: QuizSession,
    last_seen: DateTime<Utc>,
}

/// In-memory sessions keyed by id. Each learner gets an isolated `QuizSession`.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Stores a new session, evicting sessions idle past the timeout.
    pub async fn create(&self, session: QuizSession, now: DateTime<Utc>) -> Uuid {
        let mut sessions = self.inner.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle quiz sessions");
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                session,
                last_seen: now,
            },
        );
        id
    }

    /// Runs one transition against a session while holding the write lock.
    pub async fn update<R, F>(&self, id: Uuid, now: DateTime<Utc>, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut QuizSession) -> Result<R, AppError>,
    {
        let mut sessions = self.inner.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        entry.last_seen = now;
        f(&mut entry.session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
