use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

use super::types::{InMemorySessionStore, SessionStore, effective_ttl};

impl InMemorySessionStore {
    pub fn new(segment: impl Into<String>, default_ttl: u64) -> Self {
        let segment = segment.into();
        tracing::info!(
            "Creating new in-memory session store: segment={}, default_ttl={}s",
            segment,
            default_ttl
        );
        Self {
            segment,
            default_ttl,
            entry: Mutex::new(HashMap::new()),
        }
    }

    fn make_key(&self, sid: &str) -> String {
        format!("{}:{sid}", self.segment)
    }

    /// Number of live (unexpired) records.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entry
            .lock()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn get(&self, sid: &str) -> Result<Option<Value>, StorageError> {
        let key = self.make_key(sid);
        let mut entry = self.entry.lock().await;

        match entry.get(&key) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                tracing::debug!("Session record expired: {}", key);
                entry.remove(&key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, sid: &str, payload: &Value, ttl: Option<u64>) -> Result<(), StorageError> {
        let key = self.make_key(sid);
        let ttl = effective_ttl(ttl, self.default_ttl);
        let now = Utc::now();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| StorageError::Storage(format!("TTL out of range: {ttl}")))?;

        let mut entry = self.entry.lock().await;
        let before = entry.len();
        entry.retain(|_, (_, expires_at)| *expires_at > now);
        if entry.len() < before {
            tracing::debug!("Purged {} expired session records", before - entry.len());
        }
        entry.insert(key, (payload.clone(), expires_at));
        Ok(())
    }

    async fn remove(&self, sid: &str) -> Result<(), StorageError> {
        let key = self.make_key(sid);
        self.entry.lock().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_make_key() {
        // Given a store with a segment
        let store = InMemorySessionStore::new("sessions", 60);

        // Then keys are namespaced by segment
        assert_eq!(store.make_key("sid_abc"), "sessions:sid_abc");
    }

    #[tokio::test]
    async fn test_init() {
        let store = InMemorySessionStore::new("sessions", 60);
        assert!(store.init().await.is_ok());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        // Given an in-memory store
        let store = InMemorySessionStore::new("sessions", 60);
        let payload = json!({"account": {"id": "ac_1"}});

        // When storing a payload
        store.set("sid_1", &payload, None).await.unwrap();

        // Then it can be read back unchanged
        let retrieved = store.get("sid_1").await.unwrap();
        assert_eq!(retrieved, Some(payload));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_an_error() {
        let store = InMemorySessionStore::new("sessions", 60);
        let result = store.get("nope").await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_remove() {
        // Given a stored record
        let store = InMemorySessionStore::new("sessions", 60);
        store.set("sid_1", &json!({"a": 1}), None).await.unwrap();

        // When removing it
        store.remove("sid_1").await.unwrap();

        // Then it is gone
        assert!(store.get("sid_1").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_missing_key() {
        let store = InMemorySessionStore::new("sessions", 60);
        assert!(store.remove("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_overwrite_existing_key() {
        let store = InMemorySessionStore::new("sessions", 60);
        store.set("sid_1", &json!({"v": 1}), None).await.unwrap();
        store.set("sid_1", &json!({"v": 2}), None).await.unwrap();

        assert_eq!(store.get("sid_1").await.unwrap(), Some(json!({"v": 2})));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_record_reads_as_miss() {
        // Given a record whose expiry is already in the past
        let store = InMemorySessionStore::new("sessions", 60);
        store.set("sid_old", &json!({"a": 1}), None).await.unwrap();
        {
            let mut entry = store.entry.lock().await;
            let record = entry.get_mut("sessions:sid_old").unwrap();
            record.1 = Utc::now() - Duration::seconds(1);
        }

        // When reading it
        let result = store.get("sid_old").await.unwrap();

        // Then it is a miss and the record has been purged
        assert!(result.is_none());
        assert!(store.entry.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_purges_abandoned_records() {
        // Given many records that expired without being read again
        let store = InMemorySessionStore::new("sessions", 60);
        for i in 0..100 {
            store.set(&format!("sid_{i}"), &json!({"i": i}), None).await.unwrap();
        }
        {
            let mut entry = store.entry.lock().await;
            for record in entry.values_mut() {
                record.1 = Utc::now() - Duration::seconds(1);
            }
        }

        // When a fresh record is written
        store.set("sid_fresh", &json!({}), None).await.unwrap();

        // Then only the live record remains in the map
        let entry = store.entry.lock().await;
        assert_eq!(entry.len(), 1);
        assert!(entry.contains_key("sessions:sid_fresh"));
    }

    #[tokio::test]
    async fn test_set_rejects_ttl_out_of_range() {
        let store = InMemorySessionStore::new("sessions", 60);

        let result = store.set("sid_1", &json!({}), Some(100_000_000_000_000)).await;
        assert!(matches!(result, Err(StorageError::Storage(msg)) if msg.contains("out of range")));

        let result = store.set("sid_2", &json!({}), Some(u64::MAX)).await;
        assert!(matches!(result, Err(StorageError::Storage(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_refreshes_expiry() {
        let store = InMemorySessionStore::new("sessions", 60);
        store.set("sid_1", &json!({}), Some(1)).await.unwrap();
        let first = store.entry.lock().await["sessions:sid_1"].1;

        store.set("sid_1", &json!({}), None).await.unwrap();
        let second = store.entry.lock().await["sessions:sid_1"].1;

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_segments_are_isolated() {
        let store_a = InMemorySessionStore::new("a", 60);
        let store_b = InMemorySessionStore::new("b", 60);
        store_a.set("same", &json!("a"), None).await.unwrap();

        assert!(store_b.get("same").await.unwrap().is_none());
        assert_eq!(store_a.make_key("same"), "a:same");
        assert_eq!(store_b.make_key("same"), "b:same");
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(InMemorySessionStore::new("sessions", 60));
        let mut handles = vec![];

        for i in 0..5 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let sid = format!("sid_{i}");
                store.set(&sid, &json!({"i": i}), None).await.unwrap();
                store.get(&sid).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.unwrap();
            assert_eq!(result, Some(json!({"i": i})));
        }
    }
}
