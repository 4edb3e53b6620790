//! cookie-session-axum - Axum integration for cookie-session
//!
//! `session_manager` wraps a router and owns the request's session handles;
//! `require_auth` guards routes with a [`RoutePolicy`](cookie_session::RoutePolicy).
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{Router, middleware::from_fn_with_state, routing::get};
//! use cookie_session::{AuthMode, RoutePolicy, SessionAuth, SessionCookieOptions};
//! use cookie_session_axum::{AuthInfo, RouteAuth, require_auth, session_manager};
//!
//! async fn whoami(auth: AuthInfo) -> String {
//!     format!("{:?}", auth.credentials())
//! }
//!
//! let auth = Arc::new(SessionAuth::single(SessionCookieOptions::new())?);
//! let route = RouteAuth::new(auth.clone(), RoutePolicy::new(AuthMode::Required))?;
//! let app: Router = Router::new()
//!     .route("/", get(whoami))
//!     .route_layer(from_fn_with_state(route, require_auth))
//!     .layer(from_fn_with_state(auth, session_manager));
//! # Ok::<(), cookie_session::ConfigError>(())
//! ```

mod error;
mod middleware;
mod route;
mod session;

pub use error::SessionRejection;
pub use middleware::{require_auth, session_manager};
pub use route::RouteAuth;
pub use session::{AuthInfo, Session, SessionContext};

pub use cookie_session;
