//! Session storage boundary.

use super::state::SessionState;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed storage for session records. Implementations hand out snapshots; writes replace
/// the whole record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionState>;

    async fn put(&self, state: SessionState);

    async fn remove(&self, session_id: &str) -> Option<SessionState>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn put(&self, state: SessionState) {
        self.sessions
            .write()
            .await
            .insert(state.session_id.clone(), state);
    }

    async fn remove(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.write().await.remove(session_id)
    }
}
