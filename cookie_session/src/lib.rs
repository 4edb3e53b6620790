//! cookie-session - Cookie-based session authentication
//!
//! Issues an opaque session id in a cookie, keeps the session payload in an
//! expiring key-value store, and decides per request whether the caller is
//! authenticated. The crate is framework-agnostic: a host pipeline calls
//! [`SessionAuth::begin_request`] before authentication, [`SessionAuth::authorize`]
//! (or [`SessionAuth::authenticate`]) per route, and [`SessionAuth::finish_request`]
//! before the response is written.
//!
//! ```no_run
//! use cookie_session::{RedirectTo, SessionAuth, SessionCookieOptions};
//!
//! let auth = SessionAuth::single(
//!     SessionCookieOptions::new()
//!         .cookie("my_app_sid")
//!         .redirect_to(RedirectTo::literal("/login"))
//!         .append_next(true),
//! )?;
//! # Ok::<(), cookie_session::ConfigError>(())
//! ```

mod auth;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use auth::{
    AppendNext, AppendNextOption, AuthDecision, AuthError, AuthMode, AuthOutcome, BoxError,
    ConfigError, MisuseError, RedirectDecision, RedirectFn, RedirectTo, RequestSessions,
    RequestTarget, RoutePolicy, SessionAuth, SessionAuthBuilder, SessionCookieOptions,
    SessionSettings, UnauthenticatedReason, UnauthorizedError, ValidateSession, ValidationResult,
    resolve_redirect, sid_from_headers,
};

pub use session::{
    CookieChange, CookieDefinition, CookieRegistry, DEFAULT_COOKIE_NAME, DEFAULT_DECORATION_NAME,
    DEFAULT_SESSION_TTL, DEFAULT_STRATEGY_NAME, LoadState, ReportHook, ResponseCookies,
    SESSION_SCHEME, SameSite, SessionError, SessionHandle, default_report,
};

pub use storage::{
    InMemorySessionStore, RedisSessionStore, SessionStore, StorageError, store_from_env,
};

pub use utils::{UtilError, gen_base62_string, gen_session_id};
