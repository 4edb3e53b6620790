/// Scheme tag carried by unauthorized errors and the `WWW-Authenticate` header
pub const SESSION_SCHEME: &str = "session_cookie";

/// Default name of the session cookie
pub const DEFAULT_COOKIE_NAME: &str = "sid";

/// Default session lifetime: 14 days, in seconds
pub const DEFAULT_SESSION_TTL: u64 = 14 * 24 * 60 * 60;

pub const DEFAULT_COOKIE_PATH: &str = "/";

/// Literal prefix of generated session ids
pub const DEFAULT_SID_PREFIX: &str = "sid_";

/// Default decoration key under which a request exposes its session handle
pub const DEFAULT_DECORATION_NAME: &str = "session";

/// Segment used when the default in-memory store is provisioned
pub const DEFAULT_STORE_SEGMENT: &str = "sessions";

/// Default strategy name used by the single-strategy registration helper
pub const DEFAULT_STRATEGY_NAME: &str = "session";
