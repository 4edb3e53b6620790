use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use cookie_session::{AuthDecision, RequestTarget, SessionAuth};

use super::error::SessionRejection;
use super::route::RouteAuth;
use super::session::{AuthInfo, SessionContext};

/// Attach per-request session handles and persist them once the response is built
///
/// Install with `axum::middleware::from_fn_with_state(auth, session_manager)`
/// on every route that authenticates or touches [`Session`](crate::Session).
/// When persisting fails, the handler's response is replaced with a 500 and no
/// session cookie is sent.
pub async fn session_manager(
    State(auth): State<Arc<SessionAuth>>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = SessionContext::new(auth.begin_request());
    req.extensions_mut().insert(context.clone());

    let mut response = next.run(req).await;

    let mut sessions = context.lock().await;
    match auth
        .finish_request(&mut sessions, response.headers_mut())
        .await
    {
        Ok(()) => response,
        Err(e) => SessionRejection::from(e).into_response(),
    }
}

/// Authenticate the request against a route policy
///
/// Install with `axum::middleware::from_fn_with_state(route_auth, require_auth)`
/// inside `session_manager`. On success the outcome is available to handlers
/// through [`AuthInfo`].
pub async fn require_auth(
    State(route): State<RouteAuth>,
    req: Request,
    next: Next,
) -> Result<Response, SessionRejection> {
    let context = req
        .extensions()
        .get::<SessionContext>()
        .cloned()
        .ok_or(SessionRejection::MissingContext)?;

    // Nested routers strip their prefix from `req.uri()`
    let target = match req.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => RequestTarget::from_uri(uri),
        None => RequestTarget::from_uri(req.uri()),
    };

    let (mut parts, body) = req.into_parts();
    let decision = {
        let mut sessions = context.lock().await;
        route
            .auth
            .authorize(&route.policy, &parts, &target, &mut sessions)
            .await?
    };

    match decision {
        AuthDecision::Proceed(outcome) => {
            tracing::debug!(
                "Route authentication passed (authenticated: {})",
                outcome.is_authenticated()
            );
            parts.extensions.insert(AuthInfo::from(outcome));
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        AuthDecision::Redirect(uri) => Err(SessionRejection::Redirect(uri)),
        AuthDecision::Reject(err) => {
            tracing::debug!("Route authentication rejected: {}", err);
            Err(SessionRejection::Unauthorized(err))
        }
    }
}
