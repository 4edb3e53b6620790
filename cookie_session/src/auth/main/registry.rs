use http::HeaderMap;
use http::request::Parts;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::config::{SessionCookieOptions, SessionSettings};
use crate::auth::errors::{AuthError, ConfigError, UnauthorizedError};
use crate::auth::types::{AuthMode, AuthOutcome, RedirectTo, RequestTarget, UnauthenticatedReason};
use crate::session::{
    CookieRegistry, DEFAULT_SESSION_TTL, DEFAULT_STORE_SEGMENT, DEFAULT_STRATEGY_NAME,
    ResponseCookies, SessionError, SessionHandle,
};
use crate::storage::{InMemorySessionStore, SessionStore};

use super::redirect::{RedirectDecision, resolve};
use super::scheme;

/// Registers strategies, checking cookie and decoration ownership as it goes.
#[derive(Default)]
pub struct SessionAuthBuilder {
    strategies: Vec<Arc<SessionSettings>>,
    cookies: CookieRegistry,
    decorations: Vec<Arc<SessionSettings>>,
    default_store: Option<Arc<dyn SessionStore>>,
}

impl SessionAuthBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `options` under `strategy`.
    ///
    /// Strategies without an explicit store share one in-memory store.
    pub fn register(
        mut self,
        strategy: &str,
        options: SessionCookieOptions,
    ) -> Result<Self, ConfigError> {
        if self.strategies.iter().any(|s| s.strategy() == strategy) {
            return Err(ConfigError::DuplicateStrategy(strategy.to_string()));
        }

        let options = if options.has_store() {
            options
        } else {
            let default_ttl = options
                .cookie_ttl()
                .filter(|ttl| *ttl > 0)
                .unwrap_or(DEFAULT_SESSION_TTL);
            let store = self
                .default_store
                .get_or_insert_with(|| {
                    Arc::new(InMemorySessionStore::new(DEFAULT_STORE_SEGMENT, default_ttl))
                })
                .clone();
            options.store(store)
        };

        let settings = Arc::new(options.build(strategy)?);

        if settings.skip_cookie_state() {
            tracing::debug!(
                "Strategy '{}' reuses cookie '{}' without declaring it",
                strategy,
                settings.cookie_name()
            );
        } else {
            self.cookies
                .declare(settings.cookie_name(), settings.cookie_definition().clone())?;
        }

        let decorated = self
            .decorations
            .iter()
            .any(|d| d.decoration_name() == settings.decoration_name());
        if !decorated {
            self.decorations.push(settings.clone());
        } else if !settings.ignore_if_decorated() {
            return Err(ConfigError::DecorationConflict(
                settings.decoration_name().to_string(),
            ));
        } else {
            tracing::debug!(
                "Strategy '{}' shares the '{}' session handle",
                strategy,
                settings.decoration_name()
            );
        }

        tracing::info!("Registered session strategy '{}'", strategy);
        self.strategies.push(settings);
        Ok(self)
    }

    pub fn build(self) -> SessionAuth {
        SessionAuth {
            strategies: self.strategies,
            cookies: self.cookies,
            decorations: self.decorations,
        }
    }
}

/// Per-route authentication requirements.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub mode: AuthMode,
    /// Tried in order; the first success wins
    pub strategies: Vec<String>,
    /// Replaces the strategies' redirect target on this route
    pub redirect_to: Option<RedirectTo>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            mode: AuthMode::Required,
            strategies: vec![DEFAULT_STRATEGY_NAME.to_string()],
            redirect_to: None,
        }
    }
}

impl RoutePolicy {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn strategies<I, S>(mut self, strategies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies = strategies.into_iter().map(Into::into).collect();
        self
    }

    pub fn redirect_to(mut self, redirect_to: RedirectTo) -> Self {
        self.redirect_to = Some(redirect_to);
        self
    }
}

/// How the request should continue after route authentication.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthDecision {
    /// Run the handler. Carries the authenticated outcome, or the last
    /// unauthenticated one on optional and try routes.
    Proceed(AuthOutcome),
    Redirect(String),
    Reject(UnauthorizedError),
}

/// Session handles and pending cookie changes of one request.
#[derive(Debug)]
pub struct RequestSessions {
    handles: Vec<(String, SessionHandle)>,
    cookies: ResponseCookies,
}

impl RequestSessions {
    pub fn session(&self, decoration: &str) -> Option<&SessionHandle> {
        self.handles
            .iter()
            .find(|(name, _)| name == decoration)
            .map(|(_, handle)| handle)
    }

    pub fn session_mut(&mut self, decoration: &str) -> Option<&mut SessionHandle> {
        self.handles
            .iter_mut()
            .find(|(name, _)| name == decoration)
            .map(|(_, handle)| handle)
    }

    pub fn cookies(&self) -> &ResponseCookies {
        &self.cookies
    }

    /// The handle under `decoration` together with the response cookie writer.
    pub fn handle_and_cookies(
        &mut self,
        decoration: &str,
    ) -> Option<(&mut SessionHandle, &mut ResponseCookies)> {
        let handle = self
            .handles
            .iter_mut()
            .find(|(name, _)| name == decoration)
            .map(|(_, handle)| handle)?;
        Some((handle, &mut self.cookies))
    }

    fn require(
        &mut self,
        decoration: &str,
    ) -> Result<(&mut SessionHandle, &mut ResponseCookies), SessionError> {
        self.handle_and_cookies(decoration)
            .ok_or_else(|| SessionError::NotDecorated(decoration.to_string()))
    }

    pub async fn start(&mut self, decoration: &str, payload: Value) -> Result<String, SessionError> {
        let (handle, cookies) = self.require(decoration)?;
        handle.start(payload, cookies).await
    }

    pub async fn start_with_id(
        &mut self,
        decoration: &str,
        sid: &str,
        payload: Value,
    ) -> Result<(), SessionError> {
        let (handle, cookies) = self.require(decoration)?;
        handle.start_with_id(sid, payload, cookies).await
    }

    pub async fn destroy(&mut self, decoration: &str) -> Result<(), SessionError> {
        let (handle, cookies) = self.require(decoration)?;
        handle.destroy(cookies).await
    }
}

/// Registered session-cookie strategies.
///
/// Built once at startup and shared by all requests. A request runs
/// [`begin_request`](Self::begin_request) first, authenticates against any
/// number of strategies, and ends with [`finish_request`](Self::finish_request).
#[derive(Debug)]
pub struct SessionAuth {
    strategies: Vec<Arc<SessionSettings>>,
    cookies: CookieRegistry,
    decorations: Vec<Arc<SessionSettings>>,
}

impl SessionAuth {
    pub fn builder() -> SessionAuthBuilder {
        SessionAuthBuilder::new()
    }

    /// One strategy named `session`.
    pub fn single(options: SessionCookieOptions) -> Result<Self, ConfigError> {
        Ok(Self::builder()
            .register(DEFAULT_STRATEGY_NAME, options)?
            .build())
    }

    pub fn strategy(&self, name: &str) -> Option<&Arc<SessionSettings>> {
        self.strategies.iter().find(|s| s.strategy() == name)
    }

    pub fn cookies(&self) -> &CookieRegistry {
        &self.cookies
    }

    /// Check that every strategy a route names is registered.
    pub fn check_policy(&self, policy: &RoutePolicy) -> Result<(), ConfigError> {
        if policy.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "route must name at least one strategy".to_string(),
            ));
        }
        match policy
            .strategies
            .iter()
            .find(|name| self.strategy(name).is_none())
        {
            Some(name) => Err(ConfigError::Invalid(format!(
                "Unknown authentication strategy: {name}"
            ))),
            None => Ok(()),
        }
    }

    /// Fresh, unloaded handles for one request, one per decoration name.
    pub fn begin_request(&self) -> RequestSessions {
        RequestSessions {
            handles: self
                .decorations
                .iter()
                .map(|s| (s.decoration_name().to_string(), SessionHandle::new(s.clone())))
                .collect(),
            cookies: ResponseCookies::new(),
        }
    }

    /// Run `strategy` against the request.
    pub async fn authenticate(
        &self,
        strategy: &str,
        parts: &Parts,
        sessions: &mut RequestSessions,
    ) -> Result<AuthOutcome, AuthError> {
        let settings = self
            .strategy(strategy)
            .ok_or_else(|| AuthError::UnknownStrategy(strategy.to_string()))?;
        let (handle, cookies) = sessions.require(settings.decoration_name())?;
        scheme::authenticate(settings, parts, handle, cookies).await
    }

    /// Authenticate a request against a route's policy.
    ///
    /// Strategies are tried in order. Only a missing cookie moves on to the next
    /// strategy; a redirect, an invalid session or a rejection ends the attempt.
    pub async fn authorize(
        &self,
        policy: &RoutePolicy,
        parts: &Parts,
        target: &RequestTarget,
        sessions: &mut RequestSessions,
    ) -> Result<AuthDecision, AuthError> {
        let mut last = None;

        for name in &policy.strategies {
            let outcome = self.authenticate(name, parts, sessions).await?;
            let AuthOutcome::Unauthenticated { reason, error } = outcome else {
                return Ok(AuthDecision::Proceed(outcome));
            };

            let settings = self
                .strategy(name)
                .ok_or_else(|| AuthError::UnknownStrategy(name.clone()))?;
            match resolve(
                settings,
                policy.redirect_to.as_ref(),
                policy.mode,
                parts,
                target,
                error,
            ) {
                RedirectDecision::Redirect(uri) => return Ok(AuthDecision::Redirect(uri)),
                RedirectDecision::PassThrough(error) => {
                    let missing = reason == UnauthenticatedReason::MissingCredentials;
                    last = Some((reason, error));
                    if !missing {
                        tracing::debug!("Strategy '{}' ended authentication", name);
                        break;
                    }
                }
            }
        }

        let (reason, error) = last.unwrap_or((
            UnauthenticatedReason::MissingCredentials,
            UnauthorizedError::missing(),
        ));
        let decision = match policy.mode {
            AuthMode::Required => AuthDecision::Reject(error),
            AuthMode::Optional if reason != UnauthenticatedReason::MissingCredentials => {
                AuthDecision::Reject(error)
            }
            AuthMode::Optional | AuthMode::Try => {
                AuthDecision::Proceed(AuthOutcome::unauthenticated(reason, error))
            }
        };
        Ok(decision)
    }

    /// Persist every loaded session, then render cookie changes into `headers`.
    ///
    /// All handles are saved even if one fails; the first failure is returned and
    /// no cookies are written in that case.
    pub async fn finish_request(
        &self,
        sessions: &mut RequestSessions,
        headers: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        let mut first_error = None;
        for (_, handle) in sessions.handles.iter_mut() {
            if let Err(e) = handle.save().await {
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        sessions.cookies.write_headers(&self.cookies, headers)?;
        Ok(())
    }
}
