use headers::{Cookie, HeaderMapExt};
use http::HeaderMap;
use http::request::Parts;
use serde_json::json;

use crate::auth::config::SessionSettings;
use crate::auth::errors::{AuthError, MisuseError, UnauthorizedError};
use crate::auth::types::{AuthOutcome, UnauthenticatedReason};
use crate::session::{ResponseCookies, SessionHandle};

use super::validate::ValidationResult;

/// Run one session-cookie strategy against a request.
///
/// `handle` is the request's session handle for the strategy's decoration name.
/// Cookie changes are recorded in `cookies` only after every store and hook call
/// has settled.
#[tracing::instrument(skip_all, fields(strategy = %settings.strategy()))]
pub(crate) async fn authenticate(
    settings: &SessionSettings,
    parts: &Parts,
    handle: &mut SessionHandle,
    cookies: &mut ResponseCookies,
) -> Result<AuthOutcome, AuthError> {
    let Some(sid) = sid_from_headers(&parts.headers, settings.cookie_name()) else {
        tracing::debug!("No session cookie '{}' on request", settings.cookie_name());
        return Ok(AuthOutcome::unauthenticated(
            UnauthenticatedReason::MissingCredentials,
            UnauthorizedError::missing(),
        ));
    };

    handle.bind(&sid);
    if let Err(e) = handle.load().await {
        (settings.report())(
            "Failed to retrieve session from cache",
            &e,
            json!({ "sid": sid }),
        );
        return Err(e.into());
    }

    let Some(credentials) = handle.data().filter(|data| !data.is_null()).cloned() else {
        tracing::debug!("Session cookie does not match a stored session");
        cookies.unstate(settings.cookie_name());
        return Ok(AuthOutcome::unauthenticated(
            UnauthenticatedReason::InvalidSession,
            UnauthorizedError::new("Invalid session cookie"),
        ));
    };

    if let Some(validator) = settings.validator() {
        let verdict = match validator.validate(parts, &credentials).await {
            Ok(verdict) => verdict,
            Err(e) => match e.downcast::<UnauthorizedError>() {
                Ok(unauthorized) => ValidationResult::Invalid(Some(*unauthorized)),
                Err(e) => match e.downcast::<MisuseError>() {
                    Ok(misuse) => return Err(AuthError::Misuse(*misuse)),
                    Err(e) => {
                        tracing::error!("Session validation hook failed: {}", e);
                        return Err(AuthError::Hook(e));
                    }
                },
            },
        };

        if let ValidationResult::Invalid(error) = verdict {
            tracing::debug!("Session rejected by validation hook");
            if settings.clear_invalid() {
                cookies.unstate(settings.cookie_name());
            }
            return Ok(AuthOutcome::unauthenticated(
                UnauthenticatedReason::Rejected,
                error.unwrap_or_else(|| UnauthorizedError::new("Invalid session state")),
            ));
        }
    }

    if settings.keep_alive() {
        cookies.state(settings.cookie_name(), &sid);
    }

    Ok(AuthOutcome::Authenticated {
        credentials,
        artifact: sid,
        strategy: settings.strategy().to_string(),
    })
}

/// Session id carried in cookie `name`, if any.
pub fn sid_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.typed_get::<Cookie>()?;
    cookies
        .get(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
