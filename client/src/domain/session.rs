//! Session credential primitives.
//!
//! Tokens are opaque bearer strings issued by the backend. The client never
//! inspects or validates them locally beyond rejecting blank values; whether a
//! token is still usable is decided by the server's response alone.

use std::fmt;

use zeroize::Zeroizing;

/// Validation errors raised when constructing tokens from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenValidationError {
    /// The token was empty or whitespace only.
    #[error("token must not be blank")]
    Blank,
    /// The token contained characters that cannot travel in a header.
    #[error("token must not contain whitespace or control characters")]
    InvalidCharacters,
}

fn validate_token(raw: &str) -> Result<(), TokenValidationError> {
    if raw.trim().is_empty() {
        return Err(TokenValidationError::Blank);
    }
    if raw
        .chars()
        .any(|character| character.is_whitespace() || character.is_control())
    {
        return Err(TokenValidationError::InvalidCharacters);
    }
    Ok(())
}

macro_rules! bearer_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Validate and wrap a raw token string.
            pub fn new(raw: impl Into<String>) -> Result<Self, TokenValidationError> {
                let raw = raw.into();
                validate_token(&raw)?;
                Ok(Self(Zeroizing::new(raw)))
            }

            /// Borrow the raw token value for transmission.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"<redacted>").finish()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TokenValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

bearer_token! {
    /// Short-lived bearer credential attached to API requests.
    ///
    /// # Examples
    /// ```
    /// use client::domain::AccessToken;
    ///
    /// let token = AccessToken::new("abc").expect("valid token");
    /// assert_eq!(token.expose(), "abc");
    /// assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
    /// ```
    AccessToken
}

bearer_token! {
    /// Longer-lived credential exchanged for a new [`AccessToken`].
    RefreshToken
}

impl AccessToken {
    /// Render the `Authorization` header value for this token.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

/// Fixed storage keys shared by every token backend.
///
/// The same names are used for persistent store entries and for cookies so
/// that every code path observes one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    /// Slot holding the access token.
    Access,
    /// Slot holding the refresh token.
    Refresh,
}

impl TokenKey {
    /// Both keys, in the order they are written.
    pub const ALL: [Self; 2] = [Self::Access, Self::Refresh];

    /// Stable storage name for this key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tokens produced by login, registration, or refresh.
///
/// Not every issuance flow returns a refresh token, so it is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Access token to attach to subsequent requests.
    pub access: AccessToken,
    /// Refresh token, when the issuing endpoint supplied one.
    pub refresh: Option<RefreshToken>,
}

impl SessionTokens {
    /// Build a session from an access token alone.
    pub fn access_only(access: AccessToken) -> Self {
        Self {
            access,
            refresh: None,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh(mut self, refresh: RefreshToken) -> Self {
        self.refresh = Some(refresh);
        self
    }
}
