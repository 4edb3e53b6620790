use http::Uri;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::errors::{ConfigError, UnauthorizedError};

const DEFAULT_NEXT_PARAM: &str = "next";

/// How strictly a route requires authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Unauthenticated requests are redirected or rejected
    #[default]
    Required,
    /// Requests without a cookie pass; an invalid session is rejected
    Optional,
    /// Requests always pass; the outcome is only recorded
    Try,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "required" => Ok(AuthMode::Required),
            "optional" => Ok(AuthMode::Optional),
            "try" => Ok(AuthMode::Try),
            other => Err(ConfigError::Invalid(format!("Invalid auth mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// No session cookie on the request
    MissingCredentials,
    /// Cookie present but no record behind it
    InvalidSession,
    /// Record found but the validation hook rejected it
    Rejected,
}

/// Result of running one strategy against a request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated {
        credentials: Value,
        /// The session id the credentials were loaded from
        artifact: String,
        strategy: String,
    },
    Unauthenticated {
        reason: UnauthenticatedReason,
        error: UnauthorizedError,
    },
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated { .. })
    }

    pub(crate) fn unauthenticated(reason: UnauthenticatedReason, error: UnauthorizedError) -> Self {
        AuthOutcome::Unauthenticated { reason, error }
    }
}

/// `next` parameter propagation on redirects, resolved at registration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppendNext {
    #[default]
    Disabled,
    /// Append the request path and query under this parameter name
    Named(String),
    /// Append the untouched original request URI under this parameter name
    Raw(String),
}

/// Loosely typed `appendNext` input: `true`, a parameter name, or `{ raw, name }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppendNextOption {
    Flag(bool),
    Name(String),
    Object {
        #[serde(default)]
        raw: bool,
        #[serde(default)]
        name: Option<String>,
    },
}

impl Default for AppendNextOption {
    fn default() -> Self {
        AppendNextOption::Flag(false)
    }
}

impl From<bool> for AppendNextOption {
    fn from(value: bool) -> Self {
        AppendNextOption::Flag(value)
    }
}

impl From<&str> for AppendNextOption {
    fn from(value: &str) -> Self {
        AppendNextOption::Name(value.to_string())
    }
}

impl From<String> for AppendNextOption {
    fn from(value: String) -> Self {
        AppendNextOption::Name(value)
    }
}

impl AppendNextOption {
    pub fn resolve(&self) -> AppendNext {
        match self {
            AppendNextOption::Flag(false) => AppendNext::Disabled,
            AppendNextOption::Flag(true) => AppendNext::Named(DEFAULT_NEXT_PARAM.to_string()),
            AppendNextOption::Name(name) if name.is_empty() => AppendNext::Disabled,
            AppendNextOption::Name(name) => AppendNext::Named(name.clone()),
            AppendNextOption::Object { raw, name } => {
                let name = name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_NEXT_PARAM)
                    .to_string();
                if *raw {
                    AppendNext::Raw(name)
                } else {
                    AppendNext::Named(name)
                }
            }
        }
    }
}

pub type RedirectFn = Arc<dyn Fn(&Parts) -> Option<String> + Send + Sync>;

/// Where unauthenticated requests on required routes are sent.
#[derive(Clone, Default)]
pub enum RedirectTo {
    #[default]
    Disabled,
    Literal(String),
    /// Computed per request; `None` means no redirect
    Function(RedirectFn),
}

impl RedirectTo {
    pub fn literal(uri: impl Into<String>) -> Self {
        RedirectTo::Literal(uri.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Parts) -> Option<String> + Send + Sync + 'static,
    {
        RedirectTo::Function(Arc::new(f))
    }

    /// Target for this request, empty targets count as none.
    pub fn target(&self, parts: &Parts) -> Option<String> {
        let target = match self {
            RedirectTo::Disabled => None,
            RedirectTo::Literal(uri) => Some(uri.clone()),
            RedirectTo::Function(f) => f(parts),
        };
        target.filter(|uri| !uri.is_empty())
    }
}

impl fmt::Debug for RedirectTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTo::Disabled => f.write_str("Disabled"),
            RedirectTo::Literal(uri) => f.debug_tuple("Literal").field(uri).finish(),
            RedirectTo::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// The URL a request was made for, as needed by the redirect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub path: String,
    pub query: Option<String>,
    /// Request URI exactly as received
    pub raw: String,
}

impl RequestTarget {
    pub fn from_uri(uri: &Uri) -> Self {
        Self {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            raw: uri.to_string(),
        }
    }

    /// Path followed by `?query` when a query is present.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn test_append_next_resolution() {
        assert_eq!(AppendNextOption::from(false).resolve(), AppendNext::Disabled);
        assert_eq!(
            AppendNextOption::from(true).resolve(),
            AppendNext::Named("next".to_string())
        );
        assert_eq!(
            AppendNextOption::from("goto").resolve(),
            AppendNext::Named("goto".to_string())
        );
        assert_eq!(AppendNextOption::from("").resolve(), AppendNext::Disabled);
        assert_eq!(
            AppendNextOption::Object {
                raw: true,
                name: None
            }
            .resolve(),
            AppendNext::Raw("next".to_string())
        );
        assert_eq!(
            AppendNextOption::Object {
                raw: false,
                name: Some("goto".to_string())
            }
            .resolve(),
            AppendNext::Named("goto".to_string())
        );
    }

    #[test]
    fn test_append_next_option_deserialize() {
        let flag: AppendNextOption = serde_json::from_str("true").unwrap();
        assert_eq!(flag, AppendNextOption::Flag(true));

        let name: AppendNextOption = serde_json::from_str("\"goto\"").unwrap();
        assert_eq!(name, AppendNextOption::Name("goto".to_string()));

        let object: AppendNextOption = serde_json::from_str(r#"{"raw": true}"#).unwrap();
        assert_eq!(object.resolve(), AppendNext::Raw("next".to_string()));
    }

    #[test]
    fn test_auth_mode_parse() {
        assert_eq!("required".parse::<AuthMode>().unwrap(), AuthMode::Required);
        assert_eq!("Try".parse::<AuthMode>().unwrap(), AuthMode::Try);
        assert_eq!("optional".parse::<AuthMode>().unwrap(), AuthMode::Optional);
        assert!("never".parse::<AuthMode>().is_err());
        assert_eq!(AuthMode::default(), AuthMode::Required);
    }

    #[test]
    fn test_redirect_target() {
        let (parts, _) = Request::builder()
            .uri("/orgs?page=2")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(RedirectTo::Disabled.target(&parts), None);
        assert_eq!(RedirectTo::literal("").target(&parts), None);
        assert_eq!(
            RedirectTo::literal("/login").target(&parts),
            Some("/login".to_string())
        );

        let computed = RedirectTo::function(|parts: &Parts| Some(format!("/login{}", parts.uri.path())));
        assert_eq!(computed.target(&parts), Some("/login/orgs".to_string()));
        assert_eq!(format!("{computed:?}"), "Function(..)");
    }

    #[test]
    fn test_request_target_from_uri() {
        let uri: Uri = "/orgs?page=2&sort=asc".parse().unwrap();
        let target = RequestTarget::from_uri(&uri);
        assert_eq!(target.path, "/orgs");
        assert_eq!(target.path_and_query(), "/orgs?page=2&sort=asc");
        assert_eq!(target.raw, "/orgs?page=2&sort=asc");

        let bare = RequestTarget::from_uri(&"/orgs".parse().unwrap());
        assert_eq!(bare.path_and_query(), "/orgs");
    }
}
