//! Test utilities shared by the unit tests in `src/`.
//!
//! Only compiled under `cfg(test)`.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{
    HttpTransport, HttpTransportError, SessionStore, TransportRequest, TransportResponse,
};
use crate::domain::{AccessToken, RedundantSessionStore, RefreshToken, SessionTokens};
use crate::outbound::storage::MemoryTokenStorage;

/// Base URL used by every unit test client.
pub(crate) const BASE_URL: &str = "http://api.test";

type Responder =
    dyn Fn(&TransportRequest) -> Result<TransportResponse, HttpTransportError> + Send + Sync;

/// Transport double answering from a closure and recording every request.
///
/// `send` yields once before answering so concurrent callers interleave the
/// way they would against a real network.
pub(crate) struct ScriptedTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, HttpTransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in send order.
    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests sent to `path`.
    pub(crate) fn requests_to(&self, path: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.path() == path)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, HttpTransportError> {
        tokio::task::yield_now().await;
        let response = (self.responder)(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        response
    }
}

/// JSON response with the given status.
pub(crate) fn json_response(status: u16, body: &Value) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("application/json".to_owned()),
        body: body.to_string(),
    }
}

/// Plain-text response with the given status.
pub(crate) fn text_response(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("text/plain; charset=utf-8".to_owned()),
        body: body.to_owned(),
    }
}

/// In-memory redundant store used by client tests.
pub(crate) type MemorySessionStore = RedundantSessionStore<MemoryTokenStorage, MemoryTokenStorage>;

/// Session store pre-populated with the given tokens.
pub(crate) fn session_store(access: Option<&str>, refresh: Option<&str>) -> Arc<MemorySessionStore> {
    let store = Arc::new(RedundantSessionStore::new(
        Arc::new(MemoryTokenStorage::new()),
        Arc::new(MemoryTokenStorage::new()),
    ));
    if let Some(access) = access {
        let mut tokens =
            SessionTokens::access_only(AccessToken::new(access).expect("valid access token"));
        if let Some(refresh) = refresh {
            tokens = tokens.with_refresh(RefreshToken::new(refresh).expect("valid refresh token"));
        }
        store.save(&tokens);
    }
    store
}

/// Bearer header value the request carried, if any.
pub(crate) fn bearer_of(request: &TransportRequest) -> Option<&str> {
    request
        .header("authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
}
