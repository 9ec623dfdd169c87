//! Driven port for sending raw HTTP exchanges to the backend.
//!
//! The domain owns the request and response shapes so the authenticated
//! client can be exercised against scripted doubles without a network.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method token as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Verb to send.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: Url,
    /// Header map keyed by lower-case header name.
    pub headers: BTreeMap<String, String>,
    /// Optional request body.
    pub body: Option<String>,
}

impl TransportRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Raw response returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `content-type` header, if present.
    pub content_type: Option<String>,
    /// Body decoded as UTF-8 text (lossy).
    pub body: String,
}

impl TransportResponse {
    /// Whether the status lies in the 2xx success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the `content-type` header announces a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|value| {
            let media_type = value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            media_type == "application/json" || media_type.ends_with("+json")
        })
    }
}

define_port_error! {
    /// Errors surfaced before any HTTP response was received.
    pub enum HttpTransportError {
        /// Connection, DNS, or I/O failure.
        Connection { message: String } =>
            "http transport failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } =>
            "http request timed out: {message}",
    }
}

/// Port for issuing one HTTP exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the raw response, whatever its status.
    async fn send(&self, request: TransportRequest)
    -> Result<TransportResponse, HttpTransportError>;
}
