//! Redundant session persistence over two token backends.
//!
//! The primary backend is the fast local store consulted on every read. The
//! mirror exists so code paths that can only see cookies observe the same
//! session; it is written and cleared alongside the primary but never read.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{SessionStore, TokenStorage, TokenStorageError};
use crate::domain::{AccessToken, RefreshToken, SessionTokens, TokenKey};

/// Session store that keeps a primary and a mirror backend in sync.
///
/// Every failure is logged and swallowed: losing persistence must never
/// break the request that triggered it.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use client::domain::ports::SessionStore;
/// use client::domain::{AccessToken, RedundantSessionStore, SessionTokens};
/// use client::outbound::storage::MemoryTokenStorage;
///
/// let store = RedundantSessionStore::new(
///     Arc::new(MemoryTokenStorage::new()),
///     Arc::new(MemoryTokenStorage::new()),
/// );
/// let token = AccessToken::new("abc").expect("valid token");
/// store.save(&SessionTokens::access_only(token.clone()));
/// assert_eq!(store.access_token(), Some(token));
/// ```
pub struct RedundantSessionStore<P, M> {
    primary: Arc<P>,
    mirror: Arc<M>,
}

impl<P, M> Clone for RedundantSessionStore<P, M> {
    fn clone(&self) -> Self {
        Self {
            primary: Arc::clone(&self.primary),
            mirror: Arc::clone(&self.mirror),
        }
    }
}

impl<P, M> RedundantSessionStore<P, M>
where
    P: TokenStorage,
    M: TokenStorage,
{
    /// Combine a primary and a mirror backend.
    pub fn new(primary: Arc<P>, mirror: Arc<M>) -> Self {
        Self { primary, mirror }
    }

    /// Copy the primary's tokens into the mirror.
    ///
    /// Mirrors such as a fresh cookie jar start empty in a new process; call
    /// this once at startup so both backends describe the same session.
    /// Returns whether a session was found to copy.
    pub fn restore_mirror(&self) -> bool {
        let mut restored = false;
        for key in TokenKey::ALL {
            if let Some(value) = self.read_primary(key) {
                log_write_failure("mirror", key, self.mirror.write(key, &value));
                restored = true;
            }
        }
        restored
    }

    fn read_primary(&self, key: TokenKey) -> Option<String> {
        match self.primary.read(key) {
            Ok(value) => value,
            Err(error) => {
                debug!(key = %key, error_kind = error.kind(), %error, "token read failed");
                None
            }
        }
    }

    fn write_both(&self, key: TokenKey, value: &str) {
        log_write_failure("primary", key, self.primary.write(key, value));
        log_write_failure("mirror", key, self.mirror.write(key, value));
    }

    fn remove_both(&self, key: TokenKey) {
        log_write_failure("primary", key, self.primary.remove(key));
        log_write_failure("mirror", key, self.mirror.remove(key));
    }
}

fn log_write_failure(backend: &'static str, key: TokenKey, result: Result<(), TokenStorageError>) {
    if let Err(error) = result {
        warn!(
            backend,
            key = %key,
            error_kind = error.kind(),
            %error,
            "token persistence failed; continuing without it"
        );
    }
}

impl<P, M> SessionStore for RedundantSessionStore<P, M>
where
    P: TokenStorage,
    M: TokenStorage,
{
    fn access_token(&self) -> Option<AccessToken> {
        let raw = self.read_primary(TokenKey::Access)?;
        AccessToken::new(raw)
            .inspect_err(|error| debug!(%error, "stored access token unusable"))
            .ok()
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        let raw = self.read_primary(TokenKey::Refresh)?;
        RefreshToken::new(raw)
            .inspect_err(|error| debug!(%error, "stored refresh token unusable"))
            .ok()
    }

    fn save(&self, tokens: &SessionTokens) {
        self.write_both(TokenKey::Access, tokens.access.expose());
        if let Some(refresh) = &tokens.refresh {
            self.write_both(TokenKey::Refresh, refresh.expose());
        }
    }

    fn clear(&self) {
        for key in TokenKey::ALL {
            self.remove_both(key);
        }
    }
}
