use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Error from the backing session store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Session id that cannot be carried in a cookie
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// No session handle is attached under this decoration name
    #[error("No session handle under decoration '{0}'")]
    NotDecorated(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conversion() {
        let err: SessionError = StorageError::Storage("down".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: Storage error: down");
    }

    #[test]
    fn test_util_error_conversion() {
        let err: SessionError = UtilError::Crypto("rng".to_string()).into();
        assert!(matches!(err, SessionError::Utils(UtilError::Crypto(_))));
    }
}
