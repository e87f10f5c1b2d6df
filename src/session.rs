//! Conversation session storage.
//!
//! A session is a bounded FIFO of prior exchanges keyed by an opaque token.
//! Only completed exchanges are stored; a turn that fails upstream leaves the
//! session untouched.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::Exchange;
use crate::error::Result;

/// Storage for per-session conversation history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session and return its token.
    async fn create(&self) -> Result<String>;

    /// The session's exchanges, oldest first. Unknown tokens yield an empty
    /// history.
    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>>;

    /// Append a completed exchange, evicting the oldest if the session is at
    /// capacity. Appending to an unknown token creates the session.
    async fn append(&self, session_id: &str, exchange: Exchange) -> Result<()>;

    /// Drop all history for a session.
    async fn clear(&self, session_id: &str) -> Result<()>;
}

/// An in-memory [`SessionStore`] with a per-session exchange cap.
#[derive(Debug)]
pub struct InMemorySessionStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
}

impl InMemorySessionStore {
    /// Create a store that retains at most `max_history` exchanges per
    /// session.
    pub fn new(max_history: usize) -> Self {
        Self { max_history, sessions: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), VecDeque::new());
        Ok(token)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).map(|h| h.iter().cloned().collect()).unwrap_or_default())
    }

    async fn append(&self, session_id: &str, exchange: Exchange) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        if self.max_history > 0 && history.len() >= self.max_history {
            history.pop_front();
        }
        if self.max_history > 0 {
            history.push_back(exchange);
        }
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> Exchange {
        Exchange { query: format!("q{n}"), answer: format!("a{n}") }
    }

    #[tokio::test]
    async fn history_is_fifo_capped() {
        let store = InMemorySessionStore::new(2);
        let id = store.create().await.unwrap();
        for n in 0..4 {
            store.append(&id, exchange(n)).await.unwrap();
        }

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "q2");
        assert_eq!(history[1].query, "q3");
    }

    #[tokio::test]
    async fn unknown_session_has_empty_history() {
        let store = InMemorySessionStore::new(2);
        assert!(store.history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_creates_unknown_session() {
        let store = InMemorySessionStore::new(2);
        store.append("fresh", exchange(0)).await.unwrap();
        assert_eq!(store.history("fresh").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_history() {
        let store = InMemorySessionStore::new(2);
        let id = store.create().await.unwrap();
        store.append(&id, exchange(0)).await.unwrap();
        store.clear(&id).await.unwrap();
        assert!(store.history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_stores_nothing() {
        let store = InMemorySessionStore::new(0);
        let id = store.create().await.unwrap();
        store.append(&id, exchange(0)).await.unwrap();
        assert!(store.history(&id).await.unwrap().is_empty());
    }
}
