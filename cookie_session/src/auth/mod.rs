mod config;
mod errors;
mod main;
mod types;

pub use config::{SessionCookieOptions, SessionSettings};
pub use errors::{AuthError, BoxError, ConfigError, MisuseError, UnauthorizedError};
pub use main::{
    AuthDecision, RedirectDecision, RequestSessions, RoutePolicy, SessionAuth, SessionAuthBuilder,
    ValidateSession, ValidationResult, resolve_redirect, sid_from_headers,
};
pub use types::{
    AppendNext, AppendNextOption, AuthMode, AuthOutcome, RedirectFn, RedirectTo, RequestTarget,
    UnauthenticatedReason,
};
