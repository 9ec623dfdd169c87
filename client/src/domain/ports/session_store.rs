//! Session view injected into the authenticated client.
//!
//! Unlike [`super::TokenStorage`], this port never fails: persistence is a
//! best-effort convenience and an unreadable session simply reads as absent.

use crate::domain::{AccessToken, RefreshToken, SessionTokens};

/// Read/write access to the current session tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Current access token, or `None` when unauthenticated.
    fn access_token(&self) -> Option<AccessToken>;

    /// Current refresh token, if one was issued.
    fn refresh_token(&self) -> Option<RefreshToken>;

    /// Persist freshly issued tokens.
    fn save(&self, tokens: &SessionTokens);

    /// Forget every stored token.
    fn clear(&self);
}
