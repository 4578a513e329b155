//! In-Memory Stores
//!
//! DashMap-backed session and site-link stores. Used directly by small
//! deployments and as fixtures everywhere the resolver is under test.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::{SessionRecord, SessionStore, SiteLinkRecord, SiteLinkStore};

/// In-memory session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
    touches: AtomicU64,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a token
    pub fn insert(&self, token: &str, record: SessionRecord) {
        self.sessions.insert(token.to_string(), record);
    }

    /// Whether a session exists for the token
    pub fn contains(&self, token: &str) -> bool {
        self.sessions.contains_key(token)
    }

    /// How many activity refreshes the store has seen
    pub fn touch_count(&self) -> u64 {
        self.touches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn resolve(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.get(token).map(|r| r.clone())
    }

    async fn touch(&self, token: &str) {
        if self.sessions.contains_key(token) {
            self.touches.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn invalidate(&self, token: &str) {
        self.sessions.remove(token);
    }
}

/// In-memory site-link store
#[derive(Default)]
pub struct InMemorySiteLinkStore {
    links: DashMap<String, SiteLinkRecord>,
}

impl InMemorySiteLinkStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a link under a slug
    pub fn insert(&self, slug: &str, record: SiteLinkRecord) {
        self.links.insert(slug.to_string(), record);
    }
}

#[async_trait]
impl SiteLinkStore for InMemorySiteLinkStore {
    async fn resolve(&self, slug: &str) -> Option<SiteLinkRecord> {
        self.links.get(slug).map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_session_store_roundtrip() {
        let store = InMemorySessionStore::new();
        store.insert(
            "tok",
            SessionRecord {
                company_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                role: Role::Member,
                expires_at: None,
            },
        );

        assert!(store.resolve("tok").await.is_some());
        store.invalidate("tok").await;
        assert!(store.resolve("tok").await.is_none());
    }

    #[tokio::test]
    async fn test_touch_only_counts_live_sessions() {
        let store = InMemorySessionStore::new();
        store.touch("ghost").await;
        assert_eq!(store.touch_count(), 0);
    }
}
