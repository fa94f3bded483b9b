//! Nullable content store — hash-addressed in-memory documents.

use sonic_store::{ContentStore, StoreError};
use sonic_types::ContentId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// An in-memory content store for testing.
///
/// Identifiers are derived from the bytes, so storing the same document
/// twice yields the same id.
#[derive(Debug, Default)]
pub struct NullContentStore {
    objects: Mutex<HashMap<ContentId, Vec<u8>>>,
    fail_writes: AtomicBool,
    latency: Mutex<Option<Duration>>,
    writes: AtomicUsize,
}

impl NullContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail until cleared.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `latency`. Pair with `tokio::time::pause` in tests.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        lock(&self.objects).contains_key(id)
    }

    async fn stall(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ContentStore for NullContentStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentId, StoreError> {
        self.stall().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("content store unavailable".into()));
        }
        let id = ContentId::for_bytes(&bytes);
        lock(&self.objects).insert(id.clone(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StoreError> {
        self.stall().await;
        lock(&self.objects)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_store::{get_json, put_json};

    #[tokio::test]
    async fn put_then_get_returns_original_bytes() {
        let store = NullContentStore::new();
        let id = store.put(b"receipt".to_vec()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), b"receipt");
        assert_eq!(store.write_count(), 1);
        assert_eq!(id, ContentId::for_bytes(b"receipt"));
    }

    #[tokio::test]
    async fn missing_content_is_not_found() {
        let store = NullContentStore::new();
        let id = ContentId::for_bytes(b"never stored");
        assert_eq!(store.get(&id).await, Err(StoreError::NotFound(id)));
    }

    #[tokio::test]
    async fn failing_writes_store_nothing() {
        let store = NullContentStore::new();
        store.fail_writes(true);
        assert!(matches!(
            store.put(b"x".to_vec()).await,
            Err(StoreError::Backend(_))
        ));
        assert_eq!(store.write_count(), 0);
        store.fail_writes(false);
        assert!(store.put(b"x".to_vec()).await.is_ok());
    }

    #[tokio::test]
    async fn json_documents_round_trip() {
        let store = NullContentStore::new();
        let doc = serde_json::json!({"title": "Budget", "options": ["a", "b"]});
        let id = put_json(&store, &doc).await.unwrap();
        assert!(store.contains(&id));
        let back: serde_json::Value = get_json(&store, &id).await.unwrap();
        assert_eq!(back, doc);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_calls() {
        let store = NullContentStore::new();
        store.set_latency(Some(Duration::from_secs(5)));
        let started = tokio::time::Instant::now();
        store.put(b"slow".to_vec()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
