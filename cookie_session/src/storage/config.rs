use std::env;
use std::sync::Arc;

use crate::auth::ConfigError;

use super::types::{InMemorySessionStore, RedisSessionStore, SessionStore};

/// Backing store selected from the environment.
///
/// * `SESSION_STORE_TYPE` - `memory` (default) or `redis`
/// * `SESSION_STORE_URL` - connection URL, required for `redis`
///
/// The store is initialized (for Redis, a connection is opened) before it is returned.
pub async fn store_from_env(
    segment: &str,
    default_ttl: u64,
) -> Result<Arc<dyn SessionStore>, ConfigError> {
    let store_type = env::var("SESSION_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());
    let store_url = env::var("SESSION_STORE_URL").ok();

    build_store(&store_type, store_url.as_deref(), segment, default_ttl).await
}

pub(crate) async fn build_store(
    store_type: &str,
    store_url: Option<&str>,
    segment: &str,
    default_ttl: u64,
) -> Result<Arc<dyn SessionStore>, ConfigError> {
    tracing::info!(
        "Initializing session store with type: {}, segment: {}",
        store_type,
        segment
    );

    let store: Arc<dyn SessionStore> = match store_type {
        "memory" => Arc::new(InMemorySessionStore::new(segment, default_ttl)),
        "redis" => {
            let url = store_url.ok_or_else(|| {
                ConfigError::Invalid("SESSION_STORE_URL must be set for redis".to_string())
            })?;
            let store = RedisSessionStore::new(url, segment, default_ttl)?;
            store.init().await.inspect_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
            })?;
            Arc::new(store)
        }
        t => {
            return Err(ConfigError::Invalid(format!(
                "Unsupported session store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    tracing::info!("Connected to session store: type={}", store_type);
    Ok(store)
}
