//! In-memory session map. Sessions are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use mc_types::{Session, SessionStore, SessionStoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: i64, username: &str) -> Result<Session, SessionStoreError> {
        // Two v4 UUIDs give 244 random bits.
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let session = Session {
            token: token.clone(),
            user_id,
            username: username.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.sessions.write().await.insert(token, session.clone());
        tracing::debug!(user_id, "session created");
        Ok(session)
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn remove(&self, token: &str) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }
}
