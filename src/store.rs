//! Session storage.
//!
//! Contexts are held behind an injected store abstraction rather than a
//! module-global map, so embeddings can swap implementations and evict
//! sessions explicitly. Each context sits behind its own async mutex:
//! concurrently running tasks serialize their appends through the lock
//! instead of relying on single-threaded scheduling.

use crate::core::context::{SessionContext, SessionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A session context shared across concurrently running tasks.
pub type SharedContext = Arc<Mutex<SessionContext>>;

/// Store of per-session contexts, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the context for a session, creating it lazily on first use.
    async fn get_or_create(&self, id: &SessionId) -> SharedContext;

    /// Get the context for a session, if one exists.
    async fn get(&self, id: &SessionId) -> Option<SharedContext>;

    /// Remove a session's context, returning it if present.
    ///
    /// There is no automatic eviction; this is the embedding
    /// application's hook for ending a session.
    async fn remove(&self, id: &SessionId) -> Option<SharedContext>;

    /// Ids of all live sessions.
    async fn session_ids(&self) -> Vec<SessionId>;
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SharedContext>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &SessionId) -> SharedContext {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(session = %id, "creating session context");
                Arc::new(Mutex::new(SessionContext::new(id.clone())))
            })
            .clone()
    }

    async fn get(&self, id: &SessionId) -> Option<SharedContext> {
        self.sessions.lock().await.get(id).cloned()
    }

    async fn remove(&self, id: &SessionId) -> Option<SharedContext> {
        self.sessions.lock().await.remove(id)
    }

    async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.lock().await.keys().cloned().collect()
    }
}
