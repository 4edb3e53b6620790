use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::{HeaderValue, LOCATION, WWW_AUTHENTICATE};
use serde_json::json;

use cookie_session::{AuthError, SessionError, UnauthorizedError};

const REDIRECT_BODY: &str = "You are being redirected...";

/// Responses produced by the session layer instead of the route handler.
#[derive(Debug)]
pub enum SessionRejection {
    /// 401 with a JSON body and a `WWW-Authenticate` challenge
    Unauthorized(UnauthorizedError),
    /// 302 to the given location
    Redirect(String),
    /// 500; details are only logged
    Fault,
    /// Session extractors or `require_auth` used without `session_manager`
    MissingContext,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            SessionRejection::Unauthorized(err) => unauthorized_response(&err),
            SessionRejection::Redirect(uri) => {
                tracing::debug!("Redirecting to {}", uri);
                (StatusCode::FOUND, [(LOCATION, uri)], REDIRECT_BODY).into_response()
            }
            SessionRejection::Fault => internal_error_response(),
            SessionRejection::MissingContext => {
                tracing::error!("No session context on request; is session_manager installed?");
                internal_error_response()
            }
        }
    }
}

impl From<AuthError> for SessionRejection {
    fn from(err: AuthError) -> Self {
        tracing::error!("Authentication failed with a system error: {}", err);
        SessionRejection::Fault
    }
}

impl From<SessionError> for SessionRejection {
    fn from(err: SessionError) -> Self {
        tracing::error!("Session operation failed: {}", err);
        SessionRejection::Fault
    }
}

fn unauthorized_response(err: &UnauthorizedError) -> Response {
    let body = json!({
        "statusCode": 401,
        "error": "Unauthorized",
        "message": err.to_string(),
    });
    let challenge = match err.message() {
        Some(message) => format!("{} error=\"{}\"", err.scheme(), message.replace('"', "'")),
        None => err.scheme().to_string(),
    };

    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    match HeaderValue::from_str(&challenge) {
        Ok(value) => {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        Err(e) => tracing::warn!("Unable to encode WWW-Authenticate challenge: {}", e),
    }
    response
}

fn internal_error_response() -> Response {
    let body = json!({
        "statusCode": 500,
        "error": "Internal Server Error",
        "message": "An internal server error occurred",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
