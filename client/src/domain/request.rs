//! Per-call request description and header merging.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::ApiError;
use crate::domain::AccessToken;
use crate::domain::ports::HttpMethod;

const CONTENT_TYPE: &str = "content-type";
const ACCEPT: &str = "accept";
const AUTHORIZATION: &str = "authorization";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Request as described by a caller, before credentials are attached.
///
/// # Examples
/// ```
/// use client::domain::ApiRequest;
/// use client::domain::ports::HttpMethod;
///
/// let request = ApiRequest::new(HttpMethod::Get, "/api/v1/posts")
///     .with_header("X-Client", "cli");
/// assert_eq!(request.header("x-client"), Some("cli"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    body: Option<String>,
    headers: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Start a request for `path`, relative to the configured base URL.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Attach a raw body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach `value` serialised as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] when `value` cannot be serialised.
    pub fn with_json<B>(self, value: &B) -> Result<Self, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(value)
            .map_err(|error| ApiError::encode(format!("serialise request body: {error}")))?;
        Ok(self.with_body(body))
    }

    /// Set a header; names are case-insensitive and later values win.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Request verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Caller-supplied header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Final header set for the wire.
    ///
    /// JSON defaults come first, caller headers override them, and the bearer
    /// header derived from `token` is applied last.
    pub fn merged_headers(&self, token: Option<&AccessToken>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            (CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned()),
            (ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned()),
        ]);
        headers.extend(
            self.headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        if let Some(token) = token {
            headers.insert(AUTHORIZATION.to_owned(), token.bearer_header());
        }
        headers
    }
}
