use async_trait::async_trait;
use redis::{self, AsyncCommands};
use serde_json::Value;

use crate::storage::errors::StorageError;

use super::types::{RedisSessionStore, SessionStore, effective_ttl};

impl RedisSessionStore {
    pub fn new(url: &str, segment: impl Into<String>, default_ttl: u64) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            segment: segment.into(),
            default_ttl,
        })
    }

    fn make_key(&self, sid: &str) -> String {
        format!("{}:{sid}", self.segment)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn init(&self) -> Result<(), StorageError> {
        // Verify the connection works
        let _conn = self.client.get_multiplexed_async_connection().await?;
        Ok(())
    }

    async fn get(&self, sid: &str) -> Result<Option<Value>, StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = self.make_key(sid);
        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, sid: &str, payload: &Value, ttl: Option<u64>) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = self.make_key(sid);
        let value = serde_json::to_string(payload)?;
        let ttl = effective_ttl(ttl, self.default_ttl);
        let _: () = conn.set_ex(&key, value, ttl).await?;
        Ok(())
    }

    async fn remove(&self, sid: &str) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = self.make_key(sid);
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}
