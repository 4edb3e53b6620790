mod config;
mod errors;
mod memory;
mod redis;
mod types;

pub use config::store_from_env;
pub use errors::StorageError;
pub use types::{InMemorySessionStore, RedisSessionStore, SessionStore};
