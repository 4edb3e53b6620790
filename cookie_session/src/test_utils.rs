//! Shared test helpers: instrumented stores, a recording report hook and a
//! settings factory.

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::{SessionCookieOptions, SessionSettings};
use crate::session::ReportHook;
use crate::storage::{InMemorySessionStore, SessionStore, StorageError};

/// In-memory store that counts calls and remembers the last TTL passed to `set`.
pub(crate) struct RecordingStore {
    inner: InMemorySessionStore,
    calls: AtomicUsize,
    last_ttl: Mutex<Option<Option<u64>>>,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemorySessionStore::new("test", 60),
            calls: AtomicUsize::new(0),
            last_ttl: Mutex::new(None),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `Some(ttl)` once `set` has been called.
    pub(crate) fn last_ttl(&self) -> Option<Option<u64>> {
        *self.last_ttl.lock().unwrap()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn get(&self, sid: &str) -> Result<Option<Value>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(sid).await
    }

    async fn set(&self, sid: &str, payload: &Value, ttl: Option<u64>) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Storage("writes disabled".to_string()));
        }
        *self.last_ttl.lock().unwrap() = Some(ttl);
        self.inner.set(sid, payload, ttl).await
    }

    async fn remove(&self, sid: &str) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(sid).await
    }
}

/// Store whose every operation fails.
pub(crate) struct FailingStore;

#[async_trait]
impl SessionStore for FailingStore {
    async fn init(&self) -> Result<(), StorageError> {
        Err(StorageError::Storage("store unavailable".to_string()))
    }

    async fn get(&self, _sid: &str) -> Result<Option<Value>, StorageError> {
        Err(StorageError::Storage("store unavailable".to_string()))
    }

    async fn set(&self, _sid: &str, _payload: &Value, _ttl: Option<u64>) -> Result<(), StorageError> {
        Err(StorageError::Storage("store unavailable".to_string()))
    }

    async fn remove(&self, _sid: &str) -> Result<(), StorageError> {
        Err(StorageError::Storage("store unavailable".to_string()))
    }
}

pub(crate) type Reports = Arc<Mutex<Vec<(String, Value)>>>;

/// Report hook that records `(message, context)` of every call.
pub(crate) fn recording_report() -> (ReportHook, Reports) {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let captured = reports.clone();
    let hook: ReportHook = Arc::new(
        move |message: &str, _err: &(dyn Error + Send + Sync), context: Value| {
            captured
                .lock()
                .unwrap()
                .push((message.to_string(), context));
        },
    );
    (hook, reports)
}

/// Settings for strategy `session` over `store`, customized by `customize`.
pub(crate) fn settings_with<F>(store: Arc<dyn SessionStore>, customize: F) -> Arc<SessionSettings>
where
    F: FnOnce(SessionCookieOptions) -> SessionCookieOptions,
{
    let options = customize(SessionCookieOptions::new().store(store));
    Arc::new(options.build("session").unwrap())
}
