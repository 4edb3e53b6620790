use axum::{Router, middleware::from_fn_with_state, routing::get};
use std::sync::Arc;

use cookie_session::{AuthMode, ConfigError, RedirectTo, RoutePolicy, SessionAuth, SessionCookieOptions};
use cookie_session_axum::{RouteAuth, require_auth, session_manager};

use crate::handlers::{data, index, login, login_start, logout, modify};

/// Demo cookie settings; environment variables override them.
pub(crate) fn demo_options() -> SessionCookieOptions {
    SessionCookieOptions::new()
        .cookie("my_app_sid")
        .secure(false)
        .redirect_to(RedirectTo::literal("/login?param=present"))
        .append_next(true)
        .keep_alive(true)
}

pub(crate) fn router(auth: Arc<SessionAuth>) -> Result<Router, ConfigError> {
    let required = RouteAuth::new(auth.clone(), RoutePolicy::new(AuthMode::Required))?;
    let public = RouteAuth::new(
        auth.clone(),
        RoutePolicy::new(AuthMode::Try).redirect_to(RedirectTo::Disabled),
    )?;

    let protected = Router::new()
        .route("/", get(index))
        .route("/data", get(data))
        .route("/modify", get(modify))
        .route_layer(from_fn_with_state(required, require_auth));
    let open = Router::new()
        .route("/login", get(login))
        .route("/login/start", get(login_start))
        .route("/logout", get(logout))
        .route_layer(from_fn_with_state(public, require_auth));

    Ok(protected
        .merge(open)
        .layer(from_fn_with_state(auth, session_manager)))
}
