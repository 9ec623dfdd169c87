//! Session lifecycle: login, registration, logout, account deletion.
//!
//! These are the only wrappers that write or clear tokens directly; every
//! other wrapper relies on the client's refresh handling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::users::UserProfile;
use crate::domain::ports::{HttpTransport, SessionStore};
use crate::domain::{
    AccessToken, ApiClient, ApiError, LoginCredentials, RefreshToken, Registration, SessionTokens,
};

const LOGIN_PATH: &str = "/api/v1/auth/login";
const REGISTER_PATH: &str = "/api/v1/auth/register";
const LOGOUT_PATH: &str = "/api/v1/auth/logout";
const ME_PATH: &str = "/api/v1/users/me";

#[derive(Serialize)]
struct LoginRequestDto<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequestDto<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponseDto {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
    #[serde(default, alias = "refresh_token")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

impl AuthResponseDto {
    fn into_parts(self) -> Result<(SessionTokens, Option<UserProfile>), ApiError> {
        let access = AccessToken::new(self.token)
            .map_err(|error| ApiError::decode(format!("access token: {error}")))?;
        let mut tokens = SessionTokens::access_only(access);
        if let Some(raw) = self.refresh_token {
            let refresh = RefreshToken::new(raw)
                .map_err(|error| ApiError::decode(format!("refresh token: {error}")))?;
            tokens = tokens.with_refresh(refresh);
        }
        Ok((tokens, self.user))
    }
}

/// Wrapper for the authentication endpoints.
pub struct AuthApi<T: ?Sized, S: ?Sized> {
    client: Arc<ApiClient<T, S>>,
}

impl<T, S> AuthApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Wrap a shared client.
    pub fn new(client: Arc<ApiClient<T, S>>) -> Self {
        Self { client }
    }

    /// Log in and persist the issued tokens.
    ///
    /// Returns the user profile when the backend embeds one.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client; a reply without a usable
    /// token is an [`ApiError::Decode`] and stores nothing.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserProfile>, ApiError> {
        let body = LoginRequestDto {
            email: credentials.email(),
            password: credentials.password(),
        };
        let dto: AuthResponseDto = self.client.post_data(LOGIN_PATH, &body).await?;
        let user = self.start_session(dto)?;
        info!("logged in");
        Ok(user)
    }

    /// Create an account and persist the issued tokens.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<Option<UserProfile>, ApiError> {
        let credentials = registration.credentials();
        let body = RegisterRequestDto {
            username: registration.username(),
            email: credentials.email(),
            password: credentials.password(),
        };
        let dto: AuthResponseDto = self.client.post_data(REGISTER_PATH, &body).await?;
        let user = self.start_session(dto)?;
        info!("registered");
        Ok(user)
    }

    /// Profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; an expired session surfaces as a 401 after
    /// the client's refresh attempt.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.client.get_data(ME_PATH).await
    }

    /// End the session.
    ///
    /// The backend is told first on a best-effort basis; local tokens are
    /// cleared whatever the outcome.
    pub async fn logout(&self) {
        if let Err(error) = self.client.post(LOGOUT_PATH, &json!({})).await {
            debug!(%error, "logout request failed; clearing local session anyway");
        }
        self.client.session().clear();
        info!("logged out");
    }

    /// Delete the account, then clear the local session.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client; tokens are kept when the
    /// deletion fails.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.client.delete(ME_PATH).await?;
        self.client.session().clear();
        info!("account deleted");
        Ok(())
    }

    fn start_session(&self, dto: AuthResponseDto) -> Result<Option<UserProfile>, ApiError> {
        let (tokens, user) = dto.into_parts()?;
        self.client.session().save(&tokens);
        Ok(user)
    }
}
