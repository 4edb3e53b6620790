mod config;
mod errors;
mod main;
mod types;

pub use config::{
    DEFAULT_COOKIE_NAME, DEFAULT_COOKIE_PATH, DEFAULT_DECORATION_NAME, DEFAULT_SESSION_TTL,
    DEFAULT_SID_PREFIX, DEFAULT_STORE_SEGMENT, DEFAULT_STRATEGY_NAME, SESSION_SCHEME,
};
pub use errors::SessionError;
pub use main::{CookieChange, CookieDefinition, CookieRegistry, ResponseCookies, SameSite, SessionHandle};
pub use types::{LoadState, ReportHook, default_report};

pub(crate) use main::{is_valid_cookie_name, is_valid_cookie_value};
