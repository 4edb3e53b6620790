use axum::extract::FromRequestParts;
use http::request::Parts;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use cookie_session::{
    AuthOutcome, DEFAULT_DECORATION_NAME, RequestSessions, SessionError, UnauthorizedError,
};

use super::error::SessionRejection;

/// Request-scoped session state shared by the middleware and the handler.
#[derive(Clone, Debug)]
pub struct SessionContext(Arc<Mutex<RequestSessions>>);

impl SessionContext {
    pub(crate) fn new(sessions: RequestSessions) -> Self {
        Self(Arc::new(Mutex::new(sessions)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, RequestSessions> {
        self.0.lock().await
    }
}

/// The request's session handle, available as an Axum extractor
///
/// Requires the `session_manager` middleware. Changes to the payload are
/// persisted when the response is written; `start` and `destroy` take effect
/// immediately in the store.
///
/// # Example
///
/// ```no_run
/// use axum::response::Redirect;
/// use cookie_session_axum::Session;
/// use serde_json::json;
///
/// async fn login(session: Session) -> Result<Redirect, cookie_session_axum::SessionRejection> {
///     session.start(json!({"account": {"id": "ac_1"}})).await?;
///     Ok(Redirect::to("/"))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Session {
    context: SessionContext,
    decoration: String,
}

impl Session {
    /// The handle registered under another decoration name.
    pub fn with_decoration(mut self, decoration: impl Into<String>) -> Self {
        self.decoration = decoration.into();
        self
    }

    pub fn decoration(&self) -> &str {
        &self.decoration
    }

    /// Start a new session under a fresh id. Returns the id.
    pub async fn start(&self, payload: Value) -> Result<String, SessionError> {
        self.context.lock().await.start(&self.decoration, payload).await
    }

    pub async fn start_with_id(&self, sid: &str, payload: Value) -> Result<(), SessionError> {
        self.context
            .lock()
            .await
            .start_with_id(&self.decoration, sid, payload)
            .await
    }

    pub async fn destroy(&self) -> Result<(), SessionError> {
        self.context.lock().await.destroy(&self.decoration).await
    }

    pub async fn load(&self) -> Result<(), SessionError> {
        let mut sessions = self.context.lock().await;
        self.handle_mut(&mut sessions)?.load().await
    }

    pub async fn save(&self) -> Result<(), SessionError> {
        let mut sessions = self.context.lock().await;
        self.handle_mut(&mut sessions)?.save().await
    }

    pub async fn sid(&self) -> Option<String> {
        let sessions = self.context.lock().await;
        sessions
            .session(&self.decoration)
            .and_then(|handle| handle.sid().map(str::to_string))
    }

    /// Snapshot of the session payload.
    pub async fn data(&self) -> Option<Value> {
        let sessions = self.context.lock().await;
        sessions
            .session(&self.decoration)
            .and_then(|handle| handle.data().cloned())
    }

    /// Mutate the payload in place. `Ok(None)` when there is no payload.
    pub async fn update<F, R>(&self, f: F) -> Result<Option<R>, SessionError>
    where
        F: FnOnce(&mut Value) -> R,
    {
        let mut sessions = self.context.lock().await;
        Ok(self.handle_mut(&mut sessions)?.data_mut().map(f))
    }

    pub async fn set_data(&self, data: Value) -> Result<(), SessionError> {
        let mut sessions = self.context.lock().await;
        self.handle_mut(&mut sessions)?.set_data(data);
        Ok(())
    }

    fn handle_mut<'a>(
        &self,
        sessions: &'a mut RequestSessions,
    ) -> Result<&'a mut cookie_session::SessionHandle, SessionError> {
        sessions
            .session_mut(&self.decoration)
            .ok_or_else(|| SessionError::NotDecorated(self.decoration.clone()))
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(SessionRejection::MissingContext)?;
        Ok(Session {
            context,
            decoration: DEFAULT_DECORATION_NAME.to_string(),
        })
    }
}

/// Authentication result of the current route, available as an Axum extractor
///
/// Populated by `require_auth`. On routes without it, the request counts as
/// unauthenticated.
#[derive(Clone, Debug, Default)]
pub struct AuthInfo {
    outcome: Option<AuthOutcome>,
}

impl From<AuthOutcome> for AuthInfo {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            outcome: Some(outcome),
        }
    }
}

impl AuthInfo {
    pub fn is_authenticated(&self) -> bool {
        self.outcome
            .as_ref()
            .is_some_and(AuthOutcome::is_authenticated)
    }

    /// Session payload of an authenticated request.
    pub fn credentials(&self) -> Option<&Value> {
        match &self.outcome {
            Some(AuthOutcome::Authenticated { credentials, .. }) => Some(credentials),
            _ => None,
        }
    }

    /// Session id of an authenticated request.
    pub fn artifact(&self) -> Option<&str> {
        match &self.outcome {
            Some(AuthOutcome::Authenticated { artifact, .. }) => Some(artifact),
            _ => None,
        }
    }

    pub fn strategy(&self) -> Option<&str> {
        match &self.outcome {
            Some(AuthOutcome::Authenticated { strategy, .. }) => Some(strategy),
            _ => None,
        }
    }

    /// Why the request is unauthenticated, on optional and try routes.
    pub fn error(&self) -> Option<&UnauthorizedError> {
        match &self.outcome {
            Some(AuthOutcome::Unauthenticated { error, .. }) => Some(error),
            _ => None,
        }
    }
}

impl<S> FromRequestParts<S> for AuthInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthInfo>().cloned().unwrap_or_default())
    }
}
