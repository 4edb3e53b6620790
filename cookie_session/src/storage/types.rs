use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

/// Keyed, expiring store holding session payloads.
///
/// A miss is a normal return value (`Ok(None)`), never an error. Anything that
/// goes wrong in the backing transport surfaces as a [`StorageError`].
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Fetch the payload stored under `sid`.
    async fn get(&self, sid: &str) -> Result<Option<Value>, StorageError>;

    /// Store `payload` under `sid`.
    ///
    /// `ttl` is in seconds; `None` or `Some(0)` means the segment's default.
    async fn set(&self, sid: &str, payload: &Value, ttl: Option<u64>) -> Result<(), StorageError>;

    /// Drop the record stored under `sid`. Dropping a missing record succeeds.
    async fn remove(&self, sid: &str) -> Result<(), StorageError>;
}

pub struct InMemorySessionStore {
    pub(super) segment: String,
    pub(super) default_ttl: u64,
    pub(super) entry: Mutex<HashMap<String, (Value, DateTime<Utc>)>>,
}

pub struct RedisSessionStore {
    pub(super) client: redis::Client,
    pub(super) segment: String,
    pub(super) default_ttl: u64,
}

pub(super) fn effective_ttl(ttl: Option<u64>, default_ttl: u64) -> u64 {
    match ttl {
        Some(ttl) if ttl > 0 => ttl,
        _ => default_ttl,
    }
}
