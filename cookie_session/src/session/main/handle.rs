use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

use crate::auth::SessionSettings;
use crate::session::errors::SessionError;
use crate::session::types::{LoadState, empty_payload};
use crate::utils::gen_session_id;

use super::cookie::{ResponseCookies, is_valid_cookie_value};

/// One request's view of one session.
///
/// Created fresh for every request, never shared between requests. The backing
/// store is the only persistence; the handle itself is dropped with the request.
pub struct SessionHandle {
    settings: Arc<SessionSettings>,
    sid: Option<String>,
    data: Option<Value>,
    state: LoadState,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("strategy", &self.settings.strategy())
            .field("sid", &self.sid)
            .field("state", &self.state)
            .finish()
    }
}

impl SessionHandle {
    pub fn new(settings: Arc<SessionSettings>) -> Self {
        Self {
            settings,
            sid: None,
            data: Some(empty_payload()),
            state: LoadState::Unloaded,
        }
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// Session payload. `None` after a load that found no record.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut Value> {
        self.data.as_mut()
    }

    /// Replace the payload; persisted on the next `save()` if the session is loaded.
    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn settings(&self) -> &Arc<SessionSettings> {
        &self.settings
    }

    /// Point the handle at `sid` for a subsequent `load()`.
    ///
    /// Binding a different id than the one already loaded drops the loaded state.
    pub(crate) fn bind(&mut self, sid: &str) {
        if self.sid.as_deref() != Some(sid) {
            self.sid = Some(sid.to_string());
            self.data = Some(empty_payload());
            self.state = LoadState::Unloaded;
        }
    }

    /// Start a new session under a freshly generated id. Returns the id.
    pub async fn start(
        &mut self,
        payload: Value,
        cookies: &mut ResponseCookies,
    ) -> Result<String, SessionError> {
        let sid = gen_session_id(self.settings.sid_prefix())?;
        self.start_with_id(sid.clone(), payload, cookies).await?;
        Ok(sid)
    }

    /// Start a new session under `sid`.
    ///
    /// The cookie is only issued after the record has been written to the store.
    #[tracing::instrument(skip_all, fields(strategy = %self.settings.strategy()))]
    pub async fn start_with_id(
        &mut self,
        sid: impl Into<String>,
        payload: Value,
        cookies: &mut ResponseCookies,
    ) -> Result<(), SessionError> {
        let sid = sid.into();
        if !is_valid_cookie_value(&sid) {
            return Err(SessionError::InvalidSessionId(sid));
        }

        self.sid = Some(sid.clone());
        self.data = Some(payload);
        self.state = LoadState::Loaded;

        if let Err(e) = self.persist().await {
            (self.settings.report())("Failed to start session", &e, json!({ "sid": sid }));
            self.reset();
            return Err(e);
        }

        cookies.state(self.settings.cookie_name(), &sid);
        tracing::debug!("Started session for cookie '{}'", self.settings.cookie_name());
        Ok(())
    }

    /// Fetch the payload for the bound id. No-op once loaded.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        if self.state == LoadState::Loaded {
            return Ok(());
        }

        let Some(sid) = self.sid.clone() else {
            tracing::debug!("No session id bound; nothing to load");
            self.data = None;
            self.state = LoadState::Loaded;
            return Ok(());
        };

        match self.settings.store().get(&sid).await {
            Ok(data) => {
                if data.is_none() {
                    tracing::debug!("No session record found for the bound id");
                }
                self.data = data;
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from(e);
                (self.settings.report())(
                    "Failed to load session from cache",
                    &err,
                    json!({ "sid": sid }),
                );
                Err(err)
            }
        }
    }

    /// Persist the current payload with the store's default TTL. No-op while unloaded.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        if self.state == LoadState::Unloaded {
            return Ok(());
        }

        if let Err(e) = self.persist().await {
            (self.settings.report())(
                "Failed to update session after response",
                &e,
                json!({ "sid": self.sid, "data": self.data }),
            );
            return Err(e);
        }
        Ok(())
    }

    /// End the session: clear the cookie, then drop the record if there is one.
    pub async fn destroy(&mut self, cookies: &mut ResponseCookies) -> Result<(), SessionError> {
        cookies.unstate(self.settings.cookie_name());

        let Some(sid) = self.sid.clone() else {
            tracing::warn!("Destroy called without an active session; only the cookie was cleared");
            return Ok(());
        };

        if let Err(e) = self.settings.store().remove(&sid).await {
            let err = SessionError::from(e);
            (self.settings.report())(
                "Failed to remove session from cache",
                &err,
                json!({ "sid": sid }),
            );
            return Err(err);
        }

        self.reset();
        Ok(())
    }

    async fn persist(&self) -> Result<(), SessionError> {
        let (Some(sid), Some(data)) = (&self.sid, &self.data) else {
            tracing::debug!("Loaded session has no record to persist");
            return Ok(());
        };
        self.settings.store().set(sid, data, None).await?;
        Ok(())
    }

    fn reset(&mut self) {
        self.sid = None;
        self.data = Some(empty_payload());
        self.state = LoadState::Unloaded;
    }
}
