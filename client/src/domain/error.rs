//! Client-level error types.
//!
//! These errors are what page-level callers see. The client does not
//! interpret backend error payloads: a non-success response surfaces the raw
//! body text, and callers parse it further if they need to.

/// Status code the backend uses to reject missing or stale credentials.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Error surfaced by [`crate::domain::ApiClient`] and the feature wrappers.
///
/// `Display` for [`ApiError::Status`] is exactly the response body text (or
/// `HTTP <status>` for an empty body) so it can be shown or parsed verbatim.
///
/// # Examples
/// ```
/// use client::domain::ApiError;
///
/// let err = ApiError::from_status(404, "");
/// assert_eq!(err.to_string(), "HTTP 404");
/// assert_eq!(err.status(), Some(404));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("transport failure: {message}")]
    Transport {
        /// Adapter-supplied description of the failure.
        message: String,
    },
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code of the final response.
        status: u16,
        /// Response body text, or `HTTP <status>` when the body was blank.
        message: String,
    },
    /// A success response claimed JSON but could not be decoded.
    #[error("response decode failed: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },
    /// A request body could not be serialised.
    #[error("request encode failed: {message}")]
    Encode {
        /// Encoder error description.
        message: String,
    },
    /// The request could not be built (bad path, bad input).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of what was wrong with the request.
        message: String,
    },
    /// The caller cancelled the request before it completed.
    #[error("request aborted")]
    Aborted,
}

impl ApiError {
    /// Build a status error, synthesising `HTTP <status>` for blank bodies.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.to_owned()
        };
        Self::Status { status, message }
    }

    /// Convenience constructor for [`ApiError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ApiError::Decode`].
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ApiError::Encode`].
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ApiError::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the final response was `401 Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED_STATUS)
    }
}
