use chrono::{Duration, Utc};
use http::HeaderMap;
use std::collections::HashMap;
use std::str::FromStr;

use crate::auth::ConfigError;
use crate::session::config::{DEFAULT_COOKIE_PATH, DEFAULT_SESSION_TTL};
use crate::utils::{UtilError, header_append_set_cookie};

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

impl FromStr for SameSite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            other => Err(ConfigError::Invalid(format!(
                "Invalid SameSite value: {other}. Expected Strict or Lax"
            ))),
        }
    }
}

/// Wire attributes of a declared cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDefinition {
    /// Lifetime in seconds. `None` or zero issues a browser-session cookie.
    pub ttl: Option<u64>,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// `None` omits the SameSite attribute
    pub same_site: Option<SameSite>,
}

impl Default for CookieDefinition {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_SESSION_TTL),
            domain: None,
            path: DEFAULT_COOKIE_PATH.to_string(),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Strict),
        }
    }
}

impl CookieDefinition {
    /// `Set-Cookie` value issuing `name=value`.
    pub fn set_cookie(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{name}={value}");
        if let Some(ttl) = self.ttl.filter(|ttl| *ttl > 0) {
            let expires_at = i64::try_from(ttl)
                .ok()
                .and_then(|secs| Utc::now().checked_add_signed(Duration::seconds(secs)));
            cookie.push_str(&format!("; Max-Age={ttl}"));
            if let Some(expires_at) = expires_at {
                cookie.push_str(&format!(
                    "; Expires={}",
                    expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
                ));
            }
        }
        self.push_attributes(&mut cookie);
        cookie
    }

    /// `Set-Cookie` value instructing the client to drop `name`.
    pub fn clear_cookie(&self, name: &str) -> String {
        let mut cookie = format!("{name}=; Max-Age=0; Expires={EXPIRED}");
        self.push_attributes(&mut cookie);
        cookie
    }

    fn push_attributes(&self, cookie: &mut String) {
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={domain}"));
        }
        cookie.push_str(&format!("; Path={}", self.path));
        if self.secure {
            cookie.push_str("; Secure");
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            cookie.push_str(&format!("; SameSite={}", same_site.as_str()));
        }
    }
}

/// Cookie declarations, one owner per cookie name.
#[derive(Debug, Clone, Default)]
pub struct CookieRegistry {
    cookies: HashMap<String, CookieDefinition>,
}

impl CookieRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the wire attributes of `name`. A second declaration of the same name fails.
    pub fn declare(
        &mut self,
        name: &str,
        definition: CookieDefinition,
    ) -> Result<(), ConfigError> {
        if self.cookies.contains_key(name) {
            return Err(ConfigError::CookieAlreadyDeclared(name.to_string()));
        }
        tracing::debug!("Declared cookie '{}': {:?}", name, definition);
        self.cookies.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CookieDefinition> {
        self.cookies.get(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    Set(String),
    Clear,
}

/// Cookie state changes recorded while handling one request.
///
/// The last change per cookie name wins. Changes are rendered into `Set-Cookie`
/// headers once the response is being written.
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies {
    changes: Vec<(String, CookieChange)>,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cookie `name` to `value` on the response.
    pub fn state(&mut self, name: &str, value: &str) {
        self.record(name, CookieChange::Set(value.to_string()));
    }

    /// Clear cookie `name` on the client.
    pub fn unstate(&mut self, name: &str) {
        self.record(name, CookieChange::Clear);
    }

    fn record(&mut self, name: &str, change: CookieChange) {
        match self.changes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = change,
            None => self.changes.push((name.to_string(), change)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CookieChange> {
        self.changes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, change)| change)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Render all recorded changes as `Set-Cookie` headers.
    pub fn write_headers(
        &self,
        registry: &CookieRegistry,
        headers: &mut HeaderMap,
    ) -> Result<(), UtilError> {
        let fallback = CookieDefinition::default();
        for (name, change) in &self.changes {
            let definition = registry.get(name).unwrap_or_else(|| {
                tracing::warn!("Cookie '{}' is not declared; using default attributes", name);
                &fallback
            });
            let cookie = match change {
                CookieChange::Set(value) => definition.set_cookie(name, value),
                CookieChange::Clear => definition.clear_cookie(name),
            };
            tracing::debug!("Set-Cookie: {}", cookie);
            header_append_set_cookie(headers, &cookie)?;
        }
        Ok(())
    }
}

/// Whether `value` can be carried verbatim as a cookie value (RFC 6265 cookie-octets).
pub(crate) fn is_valid_cookie_value(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
        })
}

/// Whether `name` is a valid cookie name (RFC 7230 token).
pub(crate) fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
