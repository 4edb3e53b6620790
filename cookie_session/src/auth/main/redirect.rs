use http::request::Parts;

use crate::auth::config::SessionSettings;
use crate::auth::errors::UnauthorizedError;
use crate::auth::types::{AppendNext, AuthMode, RedirectTo, RequestTarget};

/// What to do with an unauthenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Answer with a redirect to this URI
    Redirect(String),
    /// Surface the unauthorized error through the normal error path
    PassThrough(UnauthorizedError),
}

/// Redirect policy for an unauthenticated outcome of `settings`' strategy.
///
/// `route_override` replaces the strategy's redirect target when present,
/// including an explicit [`RedirectTo::Disabled`].
pub fn resolve(
    settings: &SessionSettings,
    route_override: Option<&RedirectTo>,
    mode: AuthMode,
    parts: &Parts,
    target: &RequestTarget,
    error: UnauthorizedError,
) -> RedirectDecision {
    let redirect_to = route_override.unwrap_or(settings.redirect_to());

    let Some(mut uri) = redirect_to.target(parts) else {
        return RedirectDecision::PassThrough(error);
    };
    if mode != AuthMode::Required {
        return RedirectDecision::PassThrough(error);
    }

    let next = match settings.append_next() {
        AppendNext::Disabled => None,
        AppendNext::Named(name) => Some((name, target.path_and_query())),
        AppendNext::Raw(name) => Some((name, target.raw.clone())),
    };
    if let Some((name, value)) = next {
        uri.push(if uri.contains('?') { '&' } else { '?' });
        uri.push_str(name);
        uri.push('=');
        uri.push_str(&urlencoding::encode(&value));
    }

    tracing::debug!("Redirecting unauthenticated request to {}", uri);
    RedirectDecision::Redirect(uri)
}
