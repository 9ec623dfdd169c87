//! Reqwest-backed HTTP transport adapter.
//!
//! This adapter owns wire details only: method and header mapping, timeout
//! and transport error mapping, and lossy UTF-8 decoding of bodies. Status
//! codes are passed through untouched; interpreting them is the client's job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};

use crate::domain::ports::{
    HttpMethod, HttpTransport, HttpTransportError, TransportRequest, TransportResponse,
};

const DEFAULT_USER_AGENT: &str = concat!("stride-client/", env!("CARGO_PKG_VERSION"));

/// HTTP transport that performs requests with a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Build a transport that sends (and records) cookies through `jar`.
    ///
    /// Share the jar with [`crate::outbound::storage::CookieJarTokenStorage`]
    /// so the session cookies ride along with every request.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_cookie_jar(timeout: Duration, jar: Arc<Jar>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_provider(jar)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, HttpTransportError> {
        let headers = build_header_map(&request)?;
        let mut builder = self
            .client
            .request(map_method(request.method), request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(map_transport_error)?;

        Ok(TransportResponse {
            status,
            content_type,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn map_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn build_header_map(request: &TransportRequest) -> Result<HeaderMap, HttpTransportError> {
    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
            HttpTransportError::connection(format!("invalid header name '{name}': {error}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|error| {
            HttpTransportError::connection(format!("invalid value for header '{name}': {error}"))
        })?;
        headers.insert(header_name, header_value);
    }
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
    Ok(headers)
}

fn map_transport_error(error: reqwest::Error) -> HttpTransportError {
    if error.is_timeout() {
        HttpTransportError::timeout(error.to_string())
    } else {
        HttpTransportError::connection(error.to_string())
    }
}
