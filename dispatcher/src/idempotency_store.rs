//! Idempotency gate store (§4.7): first sighting of a key records
//! `key -> requestId` and continues; a replay within TTL returns the
//! stored id and `already_processed`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Slot {
    request_id: String,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct IdempotencyStore {
    inner: Arc<RwLock<HashMap<String, Slot>>>,
    ttl: Duration,
}

pub enum Sighting {
    First,
    Replay { request_id: String },
}

impl IdempotencyStore {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// Records `request_id` under `key` if `key` hasn't been seen within
    /// TTL, otherwise returns the previously-recorded id.
    pub async fn sight(&self, key: &str, request_id: &str) -> Sighting {
        let mut guard = self.inner.write().await;
        if let Some(slot) = guard.get(key) {
            if slot.inserted_at.elapsed() < self.ttl {
                return Sighting::Replay { request_id: slot.request_id.clone() };
            }
        }
        guard.insert(key.to_string(), Slot { request_id: request_id.to_string(), inserted_at: Instant::now() });
        Sighting::First
    }

    pub fn spawn_sweeper(&self, interval: Duration) {
        let store = self.inner.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.write().await.retain(|_, slot| slot.inserted_at.elapsed() < ttl);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_sighting_then_replay_returns_same_id() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        match store.sight("k1", "req-1").await {
            Sighting::First => {}
            Sighting::Replay { .. } => panic!("expected first sighting"),
        }
        match store.sight("k1", "req-2").await {
            Sighting::Replay { request_id } => assert_eq!(request_id, "req-1"),
            Sighting::First => panic!("expected replay"),
        }
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_first_sighting_again() {
        let store = IdempotencyStore::new(Duration::from_millis(1));
        store.sight("k1", "req-1").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        match store.sight("k1", "req-2").await {
            Sighting::First => {}
            Sighting::Replay { .. } => panic!("expected expiry to reset sighting"),
        }
    }
}
