//! Process-wide status store (§5): single-writer per key, lock-free reads
//! that may observe stale state, entries evicted after a TTL by a
//! background sweep since no external KV/cache crate is part of this
//! codebase's dependency stack (§9 design notes).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::StatusEntry;

struct Slot {
    entry: StatusEntry,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<String, Slot>>>,
    ttl: Duration,
}

impl StatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub async fn put(&self, request_id: impl Into<String>, entry: StatusEntry) {
        self.inner.write().await.insert(request_id.into(), Slot { entry, inserted_at: Instant::now() });
    }

    /// A key with no entry is reported as PENDING to tolerate the
    /// submit/store-write propagation race (§4.8).
    pub async fn get(&self, request_id: &str) -> Option<StatusEntry> {
        self.inner.read().await.get(request_id).map(|slot| slot.entry.clone())
    }

    pub async fn contains(&self, request_id: &str) -> bool {
        self.inner.read().await.contains_key(request_id)
    }

    /// Spawns the background TTL sweep; the returned handle is detached —
    /// it lives for the process lifetime.
    pub fn spawn_sweeper(&self, interval: Duration) {
        let store = self.inner.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let mut guard = store.write().await;
                let before = guard.len();
                guard.retain(|_, slot| slot.inserted_at.elapsed() < ttl);
                let evicted = before - guard.len();
                if evicted > 0 {
                    debug!(evicted, "status_store: swept expired entries");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestStatus;

    #[tokio::test]
    async fn unknown_key_returns_none_not_an_error() {
        let store = StatusStore::new(Duration::from_secs(60));
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = StatusStore::new(Duration::from_secs(60));
        store.put("abc", StatusEntry::pending()).await;
        let entry = store.get("abc").await.unwrap();
        assert_eq!(entry.status, RequestStatus::Pending);
    }
}
