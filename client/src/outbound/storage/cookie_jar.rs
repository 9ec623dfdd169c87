//! Cookie-jar token mirror.
//!
//! Tokens are written as cookies for the backend origin into a jar shared
//! with the HTTP transport, so every outbound request carries the session
//! for server-evaluated code paths. Cookie names match the persistent store
//! keys.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::domain::TokenKey;
use crate::domain::ports::{TokenStorage, TokenStorageError};

const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Attributes applied to every session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Lifetime of a written cookie.
    pub max_age: Duration,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_COOKIE_MAX_AGE,
        }
    }
}

impl CookiePolicy {
    /// Policy with a lifetime expressed in hours (minimum one hour).
    pub fn with_max_age_hours(hours: u64) -> Self {
        Self {
            max_age: Duration::from_secs(hours.max(1).saturating_mul(60 * 60)),
        }
    }

    fn set_cookie(&self, key: TokenKey, value: &str) -> String {
        format!(
            "{}={value}; Max-Age={}; Path=/; SameSite=Lax",
            key.as_str(),
            self.max_age.as_secs()
        )
    }

    fn expire_cookie(key: TokenKey) -> String {
        format!("{}=; Max-Age=0; Path=/; SameSite=Lax", key.as_str())
    }
}

/// Token storage backed by a shared [`reqwest::cookie::Jar`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use client::domain::TokenKey;
/// use client::domain::ports::TokenStorage;
/// use client::outbound::storage::{CookieJarTokenStorage, CookiePolicy};
/// use reqwest::cookie::Jar;
///
/// let origin = url::Url::parse("http://localhost:8080").expect("valid url");
/// let storage = CookieJarTokenStorage::new(Arc::new(Jar::default()), origin, CookiePolicy::default());
/// storage.write(TokenKey::Access, "abc").expect("cookie written");
/// assert_eq!(storage.read(TokenKey::Access).expect("readable"), Some("abc".to_owned()));
/// ```
pub struct CookieJarTokenStorage {
    jar: Arc<Jar>,
    origin: Url,
    policy: CookiePolicy,
}

impl CookieJarTokenStorage {
    /// Mirror tokens into `jar` as cookies scoped to `origin`.
    pub fn new(jar: Arc<Jar>, origin: Url, policy: CookiePolicy) -> Self {
        Self {
            jar,
            origin,
            policy,
        }
    }

    /// `Cookie` header the jar would send to the backend, if any.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
    }
}

fn ensure_cookie_safe(value: &str) -> Result<(), TokenStorageError> {
    if value
        .chars()
        .any(|c| matches!(c, ';' | ',' | '"' | '\\') || c.is_whitespace() || c.is_control())
    {
        return Err(TokenStorageError::unavailable(
            "token contains characters that cannot be stored in a cookie",
        ));
    }
    Ok(())
}

impl TokenStorage for CookieJarTokenStorage {
    fn read(&self, key: TokenKey) -> Result<Option<String>, TokenStorageError> {
        let Some(header) = self.cookie_header() else {
            return Ok(None);
        };
        let value = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == key.as_str())
            .map(|(_, value)| value.to_owned())
            .filter(|value| !value.is_empty());
        Ok(value)
    }

    fn write(&self, key: TokenKey, value: &str) -> Result<(), TokenStorageError> {
        ensure_cookie_safe(value)?;
        self.jar
            .add_cookie_str(&self.policy.set_cookie(key, value), &self.origin);
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStorageError> {
        self.jar
            .add_cookie_str(&CookiePolicy::expire_cookie(key), &self.origin);
        Ok(())
    }
}
