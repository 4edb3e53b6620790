use std::fmt;
use thiserror::Error;

use crate::session::{SESSION_SCHEME, SessionError};
use crate::storage::StorageError;

/// Boxed error returned by pluggable hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid settings detected while registering strategies. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cookie '{0}' is already declared; set skip_cookie_state on all but one strategy")]
    CookieAlreadyDeclared(String),

    #[error("Request decoration '{0}' is already registered")]
    DecorationConflict(String),

    #[error("Strategy '{0}' is already registered")]
    DuplicateStrategy(String),

    #[error("Storage error: {0}")]
    Store(#[from] StorageError),
}

/// A validation hook returned a result that does not follow the contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid return from validation hook: {0}")]
pub struct MisuseError(pub String);

/// System faults raised while authenticating. Never an expected outcome.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Validation hook failed: {0}")]
    Hook(BoxError),

    #[error(transparent)]
    Misuse(#[from] MisuseError),

    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),
}

/// Payload of an unauthenticated outcome.
///
/// `message` is `None` when no credentials were presented at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedError {
    message: Option<String>,
    scheme: String,
}

impl UnauthorizedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            scheme: SESSION_SCHEME.to_string(),
        }
    }

    /// No credentials presented.
    pub fn missing() -> Self {
        Self {
            message: None,
            scheme: SESSION_SCHEME.to_string(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("Missing authentication"))
    }
}

impl std::error::Error for UnauthorizedError {}
