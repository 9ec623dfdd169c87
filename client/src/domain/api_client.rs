//! Authenticated request pipeline.
//!
//! Every call made through [`ApiClient`] reads the current access token,
//! merges headers, and sends through the [`HttpTransport`] port. A 401
//! triggers at most one refresh and one retry of the same request; the
//! retry's result is final whatever its status.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, debug_span};
use url::Url;
use uuid::Uuid;

use crate::domain::envelope::ApiPayload;
use crate::domain::error::UNAUTHORIZED_STATUS;
use crate::domain::ports::{
    HttpMethod, HttpTransport, HttpTransportError, SessionStore, TransportRequest,
    TransportResponse,
};
use crate::domain::request::ApiRequest;
use crate::domain::token_refresh::{REFRESH_PATH, RefreshOutcome, TokenRefresher};
use crate::domain::{AccessToken, ApiError};

/// Correlation header attached to every outbound request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client that injects credentials and recovers from expired tokens.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use client::domain::{ApiClient, RedundantSessionStore};
/// use client::outbound::http::ReqwestTransport;
/// use client::outbound::storage::MemoryTokenStorage;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
/// let store = Arc::new(RedundantSessionStore::new(
///     Arc::new(MemoryTokenStorage::new()),
///     Arc::new(MemoryTokenStorage::new()),
/// ));
/// let client = ApiClient::new(url::Url::parse("http://localhost:8080")?, transport, store)?;
/// let feed = client.get("/api/v1/posts").await?;
/// println!("{feed:?}");
/// # Ok(())
/// # }
/// ```
pub struct ApiClient<T: ?Sized, S: ?Sized> {
    transport: Arc<T>,
    store: Arc<S>,
    base_url: Url,
    refresher: TokenRefresher<T, S>,
}

impl<T, S> ApiClient<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when the refresh endpoint cannot
    /// be derived from `base_url`.
    pub fn new(base_url: Url, transport: Arc<T>, store: Arc<S>) -> Result<Self, ApiError> {
        let endpoint = join_url(&base_url, REFRESH_PATH)?;
        let refresher = TokenRefresher::new(Arc::clone(&transport), Arc::clone(&store), endpoint);
        Ok(Self {
            transport,
            store,
            base_url,
            refresher,
        })
    }

    /// Base URL every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session store shared with the refresher.
    pub fn session(&self) -> &S {
        &self.store
    }

    /// Whether an access token is currently stored.
    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }

    /// Refresh the session explicitly, coordinating with in-flight 401s.
    ///
    /// A [`RefreshOutcome::Rejected`] result means the session was cleared.
    pub async fn refresh_session(&self) -> RefreshOutcome {
        let current = self.store.access_token();
        self.refresher.refresh_after_rejection(current.as_ref()).await
    }

    /// Perform `request` with credentials and 401 recovery.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidRequest`] when the path does not form a URL.
    /// - [`ApiError::Transport`] when the network call fails; no refresh or
    ///   retry is attempted.
    /// - [`ApiError::Status`] for any non-2xx final response, including a
    ///   401 that survived recovery.
    /// - [`ApiError::Decode`] when a JSON response body is malformed.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiPayload, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let span = debug_span!(
            "api_request",
            method = %request.method(),
            path = request.path(),
            request_id = %request_id,
        );
        self.execute(&request, &request_id).instrument(span).await
    }

    async fn execute(&self, request: &ApiRequest, request_id: &str) -> Result<ApiPayload, ApiError> {
        let token = self.store.access_token();
        let response = self.send(request, token.as_ref(), request_id).await?;
        let response = if response.status == UNAUTHORIZED_STATUS {
            self.recover(request, token.as_ref(), request_id, response)
                .await?
        } else {
            response
        };
        into_payload(response)
    }

    async fn recover(
        &self,
        request: &ApiRequest,
        rejected: Option<&AccessToken>,
        request_id: &str,
        unauthorized: TransportResponse,
    ) -> Result<TransportResponse, ApiError> {
        match self.refresher.refresh_after_rejection(rejected).await {
            RefreshOutcome::Refreshed(fresh) => {
                debug!("retrying once with refreshed token");
                self.send(request, Some(&fresh), request_id).await
            }
            RefreshOutcome::Rejected => {
                debug!("session was not renewed; surfacing the original 401");
                Ok(unauthorized)
            }
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
        request_id: &str,
    ) -> Result<TransportResponse, ApiError> {
        let url = join_url(&self.base_url, request.path())?;
        let mut headers = request.merged_headers(token);
        headers
            .entry(REQUEST_ID_HEADER.to_owned())
            .or_insert_with(|| request_id.to_owned());

        let response = self
            .transport
            .send(TransportRequest {
                method: request.method(),
                url,
                headers,
                body: request.body().map(str::to_owned),
            })
            .await
            .map_err(map_transport_error)?;
        debug!(status = response.status, "response received");
        Ok(response)
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn get(&self, path: &str) -> Result<ApiPayload, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Get, path)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`Self::request`].
    pub async fn delete(&self, path: &str) -> Result<ApiPayload, ApiError> {
        self.request(ApiRequest::new(HttpMethod::Delete, path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Encode`] when `body` cannot be serialised, otherwise see
    /// [`Self::request`].
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<ApiPayload, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_json(HttpMethod::Post, path, body).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::post`].
    pub async fn put<B>(&self, path: &str, body: &B) -> Result<ApiPayload, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_json(HttpMethod::Put, path, body).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::post`].
    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<ApiPayload, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_json(HttpMethod::Patch, path, body).await
    }

    async fn send_json<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<ApiPayload, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let request = ApiRequest::new(method, path).with_json(body)?;
        self.request(request).await
    }

    /// `GET path`, unwrapping the envelope into `R`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Decode`] when the payload does not match `R`, otherwise see
    /// [`Self::request`].
    pub async fn get_data<R>(&self, path: &str) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        self.get(path).await?.into_data()
    }

    /// `POST path` with a JSON body, unwrapping the envelope into `R`.
    ///
    /// # Errors
    ///
    /// See [`Self::post`] and [`Self::get_data`].
    pub async fn post_data<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.post(path, body).await?.into_data()
    }

    /// `PUT path` with a JSON body, unwrapping the envelope into `R`.
    ///
    /// # Errors
    ///
    /// See [`Self::post`] and [`Self::get_data`].
    pub async fn put_data<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.put(path, body).await?.into_data()
    }
}

fn join_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    let root = base.as_str().trim_end_matches('/');
    let joined = if path.starts_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    };
    Url::parse(&joined)
        .map_err(|error| ApiError::invalid_request(format!("invalid request path '{path}': {error}")))
}

fn map_transport_error(error: HttpTransportError) -> ApiError {
    match error {
        HttpTransportError::Connection { message } => ApiError::transport(message),
        HttpTransportError::Timeout { message } => {
            ApiError::transport(format!("request timed out: {message}"))
        }
    }
}

fn into_payload(response: TransportResponse) -> Result<ApiPayload, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_status(response.status, &response.body));
    }
    if !response.is_json() {
        return Ok(ApiPayload::Text(response.body));
    }
    if response.body.trim().is_empty() {
        return Ok(ApiPayload::Json(Value::Null));
    }
    serde_json::from_str(&response.body)
        .map(ApiPayload::Json)
        .map_err(|error| ApiError::decode(format!("malformed JSON response: {error}")))
}

#[cfg(test)]
#[path = "api_client_tests.rs"]
mod tests;
