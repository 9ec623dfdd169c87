//! Access-token refresh.
//!
//! A refresh exchanges the stored refresh token for a new access token. It
//! never fails with an error: every outcome, including transport problems,
//! is reported as a [`RefreshOutcome`] for the 401 handler to act on. A
//! refresh that does not produce a token clears the session.
//!
//! Refreshes are serialised behind an async gate, and the session is cleared
//! before the gate is released. A 401 handler that waits on the gate while
//! another handler refreshes reuses that handler's result instead of
//! spending the refresh token a second time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::envelope::unwrap_envelope;
use crate::domain::ports::{HttpMethod, HttpTransport, SessionStore, TransportRequest};
use crate::domain::{AccessToken, RefreshToken, SessionTokens};

/// Backend path that exchanges refresh tokens.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A usable access token is now stored.
    Refreshed(AccessToken),
    /// The session cannot be renewed and has been cleared: no refresh
    /// token, the refresh call failed or was refused, or the response was
    /// unusable.
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponseDto {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
    #[serde(default, alias = "refresh_token")]
    refresh_token: Option<String>,
}

/// Exchanges refresh tokens through the transport and persists the result.
pub struct TokenRefresher<T: ?Sized, S: ?Sized> {
    transport: Arc<T>,
    store: Arc<S>,
    endpoint: Url,
    gate: Mutex<()>,
}

impl<T, S> TokenRefresher<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Create a refresher posting to `endpoint`.
    pub fn new(transport: Arc<T>, store: Arc<S>, endpoint: Url) -> Self {
        Self {
            transport,
            store,
            endpoint,
            gate: Mutex::new(()),
        }
    }

    /// Renew the session after `rejected` was refused with a 401.
    ///
    /// Waits for any refresh already in flight. If the stored access token
    /// changed while waiting, that token (or its absence) is the answer and
    /// no further network call is made. A failed refresh clears the session
    /// while the gate is still held, so waiters observe the cleared state.
    pub async fn refresh_after_rejection(&self, rejected: Option<&AccessToken>) -> RefreshOutcome {
        let _gate = self.gate.lock().await;
        let current = self.store.access_token();
        if current.as_ref() != rejected {
            debug!("session changed while waiting; reusing concurrent refresh result");
            return current.map_or(RefreshOutcome::Rejected, RefreshOutcome::Refreshed);
        }
        let outcome = self.exchange().await;
        if outcome == RefreshOutcome::Rejected {
            info!("session could not be renewed; clearing stored tokens");
            self.store.clear();
        }
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("no refresh token stored; skipping refresh");
            return RefreshOutcome::Rejected;
        };

        let response = match self.transport.send(self.refresh_request(&refresh_token)).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error_kind = error.kind(), %error, "refresh endpoint unreachable");
                return RefreshOutcome::Rejected;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "refresh token refused");
            return RefreshOutcome::Rejected;
        }

        match parse_refresh_body(&response.body) {
            Ok((access, rotated)) => {
                let tokens = SessionTokens {
                    access: access.clone(),
                    refresh: Some(rotated.unwrap_or(refresh_token)),
                };
                self.store.save(&tokens);
                debug!("access token refreshed");
                RefreshOutcome::Refreshed(access)
            }
            Err(message) => {
                warn!(%message, "refresh response unusable");
                RefreshOutcome::Rejected
            }
        }
    }

    fn refresh_request(&self, refresh_token: &RefreshToken) -> TransportRequest {
        let json_type = "application/json".to_owned();
        TransportRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers: BTreeMap::from([
                ("content-type".to_owned(), json_type.clone()),
                ("accept".to_owned(), json_type),
            ]),
            body: Some(json!({ "refresh_token": refresh_token.expose() }).to_string()),
        }
    }
}

fn parse_refresh_body(body: &str) -> Result<(AccessToken, Option<RefreshToken>), String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|error| format!("invalid JSON: {error}"))?;
    let dto: RefreshResponseDto = serde_json::from_value(unwrap_envelope(value))
        .map_err(|error| format!("unexpected shape: {error}"))?;
    let access =
        AccessToken::new(dto.token).map_err(|error| format!("invalid access token: {error}"))?;
    let refresh = dto
        .refresh_token
        .map(RefreshToken::new)
        .transpose()
        .map_err(|error| format!("invalid refresh token: {error}"))?;
    Ok((access, refresh))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for refresh body parsing.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::wrapped(r#"{"data":{"token":"new"}}"#, "new", None)]
    #[case::rotated(r#"{"data":{"token":"new","refreshToken":"r2"}}"#, "new", Some("r2"))]
    #[case::double(r#"{"data":{"data":{"token":"new"}}}"#, "new", None)]
    #[case::bare(r#"{"accessToken":"new"}"#, "new", None)]
    fn parses_refresh_shapes(
        #[case] body: &str,
        #[case] access: &str,
        #[case] refresh: Option<&str>,
    ) {
        let (parsed_access, parsed_refresh) = parse_refresh_body(body).expect("body parses");
        assert_eq!(parsed_access.expose(), access);
        assert_eq!(
            parsed_refresh.as_ref().map(RefreshToken::expose),
            refresh
        );
    }

    #[rstest]
    #[case::malformed("{not json")]
    #[case::missing_token(r#"{"data":{}}"#)]
    #[case::blank_token(r#"{"data":{"token":"  "}}"#)]
    #[case::html("<html>bad gateway</html>")]
    fn rejects_unusable_bodies(#[case] body: &str) {
        assert!(parse_refresh_body(body).is_err());
    }
}
