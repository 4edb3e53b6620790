use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::session::{
    CookieDefinition, DEFAULT_COOKIE_NAME, DEFAULT_COOKIE_PATH, DEFAULT_DECORATION_NAME,
    DEFAULT_SESSION_TTL, DEFAULT_SID_PREFIX, DEFAULT_STORE_SEGMENT, ReportHook, SameSite,
    default_report, is_valid_cookie_name, is_valid_cookie_value,
};
use crate::storage::{InMemorySessionStore, SessionStore};

use super::errors::ConfigError;
use super::main::ValidateSession;
use super::types::{AppendNext, AppendNextOption, RedirectTo};

/// Settings of one session-cookie strategy, as supplied by the application.
///
/// Every field has a default; see [`SessionCookieOptions::new`]. Options are
/// checked once when the strategy is registered and become an immutable
/// [`SessionSettings`].
#[derive(Clone)]
pub struct SessionCookieOptions {
    cookie: String,
    ttl: Option<u64>,
    domain: Option<String>,
    path: String,
    clear_invalid: bool,
    keep_alive: bool,
    same_site: Option<SameSite>,
    secure: bool,
    http_only: bool,
    redirect_to: RedirectTo,
    append_next: AppendNextOption,
    validate: Option<Arc<dyn ValidateSession>>,
    decoration_name: String,
    ignore_if_decorated: bool,
    skip_cookie_state: bool,
    store: Option<Arc<dyn SessionStore>>,
    report: ReportHook,
    sid_prefix: String,
}

impl Default for SessionCookieOptions {
    fn default() -> Self {
        Self {
            cookie: DEFAULT_COOKIE_NAME.to_string(),
            ttl: Some(DEFAULT_SESSION_TTL),
            domain: None,
            path: DEFAULT_COOKIE_PATH.to_string(),
            clear_invalid: false,
            keep_alive: false,
            same_site: Some(SameSite::Strict),
            secure: true,
            http_only: true,
            redirect_to: RedirectTo::Disabled,
            append_next: AppendNextOption::default(),
            validate: None,
            decoration_name: DEFAULT_DECORATION_NAME.to_string(),
            ignore_if_decorated: true,
            skip_cookie_state: false,
            store: None,
            report: default_report(),
            sid_prefix: DEFAULT_SID_PREFIX.to_string(),
        }
    }
}

impl fmt::Debug for SessionCookieOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookieOptions")
            .field("cookie", &self.cookie)
            .field("ttl", &self.ttl)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("clear_invalid", &self.clear_invalid)
            .field("keep_alive", &self.keep_alive)
            .field("same_site", &self.same_site)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("redirect_to", &self.redirect_to)
            .field("append_next", &self.append_next)
            .field("validate", &self.validate.is_some())
            .field("decoration_name", &self.decoration_name)
            .field("ignore_if_decorated", &self.ignore_if_decorated)
            .field("skip_cookie_state", &self.skip_cookie_state)
            .field("sid_prefix", &self.sid_prefix)
            .finish_non_exhaustive()
    }
}

impl SessionCookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by environment variables. See [`with_env`](Self::with_env).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of `self`. Unset variables keep the
    /// current values.
    ///
    /// * `SESSION_COOKIE_NAME` - cookie name
    /// * `SESSION_COOKIE_TTL` - lifetime in seconds, `0` for a browser-session cookie
    /// * `SESSION_COOKIE_DOMAIN`, `SESSION_COOKIE_PATH`
    /// * `SESSION_COOKIE_SECURE`, `SESSION_COOKIE_HTTP_ONLY` - `true` / `false`
    /// * `SESSION_COOKIE_SAME_SITE` - `Strict`, `Lax` or `none`
    /// * `SESSION_KEEP_ALIVE`, `SESSION_CLEAR_INVALID` - `true` / `false`
    /// * `SESSION_REDIRECT_TO` - literal redirect target, empty disables
    /// * `SESSION_APPEND_NEXT` - `true`, `false`, a parameter name, `raw` or `raw:<name>`
    /// * `SESSION_ID_PREFIX` - literal prefix of generated session ids
    pub fn with_env(self) -> Result<Self, ConfigError> {
        let mut options = self;

        if let Some(cookie) = env_string("SESSION_COOKIE_NAME") {
            options.cookie = cookie;
        }
        if let Some(ttl) = env_parse::<u64>("SESSION_COOKIE_TTL")? {
            options.ttl = Some(ttl);
        }
        if let Some(domain) = env_string("SESSION_COOKIE_DOMAIN") {
            options.domain = Some(domain);
        }
        if let Some(path) = env_string("SESSION_COOKIE_PATH") {
            options.path = path;
        }
        if let Some(secure) = env_parse::<bool>("SESSION_COOKIE_SECURE")? {
            options.secure = secure;
        }
        if let Some(http_only) = env_parse::<bool>("SESSION_COOKIE_HTTP_ONLY")? {
            options.http_only = http_only;
        }
        if let Some(same_site) = env_string("SESSION_COOKIE_SAME_SITE") {
            options.same_site = match same_site.to_ascii_lowercase().as_str() {
                "none" | "false" => None,
                _ => Some(same_site.parse()?),
            };
        }
        if let Some(keep_alive) = env_parse::<bool>("SESSION_KEEP_ALIVE")? {
            options.keep_alive = keep_alive;
        }
        if let Some(clear_invalid) = env_parse::<bool>("SESSION_CLEAR_INVALID")? {
            options.clear_invalid = clear_invalid;
        }
        if let Ok(redirect_to) = env::var("SESSION_REDIRECT_TO") {
            options.redirect_to = if redirect_to.is_empty() {
                RedirectTo::Disabled
            } else {
                RedirectTo::Literal(redirect_to)
            };
        }
        if let Some(append_next) = env_string("SESSION_APPEND_NEXT") {
            options.append_next = parse_append_next(&append_next);
        }
        if let Ok(prefix) = env::var("SESSION_ID_PREFIX") {
            options.sid_prefix = prefix;
        }

        tracing::debug!("Session cookie options from environment: {:?}", options);
        Ok(options)
    }

    pub fn cookie(mut self, name: impl Into<String>) -> Self {
        self.cookie = name.into();
        self
    }

    /// Lifetime in seconds. `None` or `Some(0)` issues a browser-session cookie.
    pub fn ttl(mut self, ttl: Option<u64>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn clear_invalid(mut self, clear_invalid: bool) -> Self {
        self.clear_invalid = clear_invalid;
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn redirect_to(mut self, redirect_to: RedirectTo) -> Self {
        self.redirect_to = redirect_to;
        self
    }

    pub fn append_next(mut self, append_next: impl Into<AppendNextOption>) -> Self {
        self.append_next = append_next.into();
        self
    }

    pub fn validate(mut self, hook: impl ValidateSession) -> Self {
        self.validate = Some(Arc::new(hook));
        self
    }

    pub fn request_decorator_name(mut self, name: impl Into<String>) -> Self {
        self.decoration_name = name.into();
        self
    }

    pub fn ignore_if_decorated(mut self, ignore: bool) -> Self {
        self.ignore_if_decorated = ignore;
        self
    }

    /// Do not declare the cookie's wire attributes; another strategy owns them.
    pub fn skip_cookie_state(mut self, skip: bool) -> Self {
        self.skip_cookie_state = skip;
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn report(mut self, report: ReportHook) -> Self {
        self.report = report;
        self
    }

    pub fn sid_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sid_prefix = prefix.into();
        self
    }

    pub(crate) fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub(crate) fn cookie_ttl(&self) -> Option<u64> {
        self.ttl
    }

    /// Validate the options for `strategy`.
    ///
    /// Without an explicit store, an in-memory store (segment `sessions`, default
    /// TTL = cookie ttl or 14 days) is provisioned.
    pub fn build(self, strategy: &str) -> Result<SessionSettings, ConfigError> {
        if strategy.is_empty() {
            return Err(ConfigError::Invalid("strategy name must not be empty".to_string()));
        }
        if !is_valid_cookie_name(&self.cookie) {
            return Err(ConfigError::Invalid(format!(
                "Invalid cookie name: '{}'",
                self.cookie
            )));
        }
        if !self.path.starts_with('/') || self.path.contains(';') {
            return Err(ConfigError::Invalid(format!(
                "Cookie path must start with '/': '{}'",
                self.path
            )));
        }
        if let Some(domain) = &self.domain {
            if domain.is_empty() || domain.contains(';') || domain.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid cookie domain: '{domain}'"
                )));
            }
        }
        if matches!(&self.redirect_to, RedirectTo::Literal(uri) if uri.is_empty()) {
            return Err(ConfigError::Invalid(
                "redirect_to must not be an empty string; use RedirectTo::Disabled".to_string(),
            ));
        }
        if !self.sid_prefix.is_empty() && !is_valid_cookie_value(&self.sid_prefix) {
            return Err(ConfigError::Invalid(format!(
                "Invalid session id prefix: '{}'",
                self.sid_prefix
            )));
        }
        if self.decoration_name.is_empty() {
            return Err(ConfigError::Invalid(
                "request decorator name must not be empty".to_string(),
            ));
        }

        let store = match self.store {
            Some(store) => store,
            None => {
                let default_ttl = self.ttl.filter(|ttl| *ttl > 0).unwrap_or(DEFAULT_SESSION_TTL);
                Arc::new(InMemorySessionStore::new(DEFAULT_STORE_SEGMENT, default_ttl))
            }
        };

        Ok(SessionSettings {
            strategy: strategy.to_string(),
            cookie: self.cookie,
            cookie_definition: CookieDefinition {
                ttl: self.ttl.filter(|ttl| *ttl > 0),
                domain: self.domain,
                path: self.path,
                secure: self.secure,
                http_only: self.http_only,
                same_site: self.same_site,
            },
            clear_invalid: self.clear_invalid,
            keep_alive: self.keep_alive,
            redirect_to: self.redirect_to,
            append_next: self.append_next.resolve(),
            validate: self.validate,
            decoration_name: self.decoration_name,
            ignore_if_decorated: self.ignore_if_decorated,
            skip_cookie_state: self.skip_cookie_state,
            store,
            report: self.report,
            sid_prefix: self.sid_prefix,
        })
    }
}

/// Validated, immutable settings of one registered strategy.
pub struct SessionSettings {
    strategy: String,
    cookie: String,
    cookie_definition: CookieDefinition,
    clear_invalid: bool,
    keep_alive: bool,
    redirect_to: RedirectTo,
    append_next: AppendNext,
    validate: Option<Arc<dyn ValidateSession>>,
    decoration_name: String,
    ignore_if_decorated: bool,
    skip_cookie_state: bool,
    store: Arc<dyn SessionStore>,
    report: ReportHook,
    sid_prefix: String,
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("strategy", &self.strategy)
            .field("cookie", &self.cookie)
            .field("cookie_definition", &self.cookie_definition)
            .field("clear_invalid", &self.clear_invalid)
            .field("keep_alive", &self.keep_alive)
            .field("redirect_to", &self.redirect_to)
            .field("append_next", &self.append_next)
            .field("decoration_name", &self.decoration_name)
            .finish_non_exhaustive()
    }
}

impl SessionSettings {
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie
    }

    pub fn cookie_definition(&self) -> &CookieDefinition {
        &self.cookie_definition
    }

    pub fn clear_invalid(&self) -> bool {
        self.clear_invalid
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn redirect_to(&self) -> &RedirectTo {
        &self.redirect_to
    }

    pub fn append_next(&self) -> &AppendNext {
        &self.append_next
    }

    pub fn validator(&self) -> Option<&Arc<dyn ValidateSession>> {
        self.validate.as_ref()
    }

    pub fn decoration_name(&self) -> &str {
        &self.decoration_name
    }

    pub fn ignore_if_decorated(&self) -> bool {
        self.ignore_if_decorated
    }

    pub fn skip_cookie_state(&self) -> bool {
        self.skip_cookie_state
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn report(&self) -> &ReportHook {
        &self.report
    }

    pub fn sid_prefix(&self) -> &str {
        &self.sid_prefix
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_string(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("Invalid value for {key}: '{value}' ({e})"))),
        None => Ok(None),
    }
}

fn parse_append_next(value: &str) -> AppendNextOption {
    match value {
        "true" => AppendNextOption::Flag(true),
        "false" => AppendNextOption::Flag(false),
        "raw" => AppendNextOption::Object {
            raw: true,
            name: None,
        },
        _ => match value.strip_prefix("raw:") {
            Some(name) => AppendNextOption::Object {
                raw: true,
                name: Some(name.to_string()),
            },
            None => AppendNextOption::Name(value.to_string()),
        },
    }
}
