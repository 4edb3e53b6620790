mod redirect;
mod registry;
mod scheme;
mod validate;

pub use redirect::{RedirectDecision, resolve as resolve_redirect};
pub use registry::{AuthDecision, RequestSessions, RoutePolicy, SessionAuth, SessionAuthBuilder};
pub use scheme::sid_from_headers;
pub use validate::{ValidateSession, ValidationResult};
