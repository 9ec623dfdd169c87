//! Domain primitives, services, and ports.
//!
//! Purpose: hold everything that decides behaviour (credentials, token
//! refresh, the 401 recovery pipeline, optimistic interaction state) behind
//! ports so adapters in [`crate::outbound`] can be swapped for doubles.
//!
//! Public surface:
//! - `ApiClient`: authenticated request pipeline.
//! - `RedundantSessionStore`: primary + mirror token persistence.
//! - `TokenRefresher` / `RefreshOutcome`: single-flight refresh.
//! - `InteractionBoard` / `OptimisticInteractions`: optimistic counters.
//! - `ApiError`: client-level error surfaced to callers.

pub mod api_client;
pub mod auth;
pub mod envelope;
pub mod error;
pub mod interaction_service;
pub mod interactions;
pub mod ports;
pub mod request;
pub mod session;
pub mod session_store;
pub mod token_refresh;

pub use self::api_client::{ApiClient, REQUEST_ID_HEADER};
pub use self::auth::{LoginCredentials, LoginValidationError, Registration};
pub use self::envelope::{ApiPayload, unwrap_envelope};
pub use self::error::{ApiError, UNAUTHORIZED_STATUS};
pub use self::interaction_service::OptimisticInteractions;
pub use self::interactions::{
    InteractionBoard, InteractionKey, InteractionKind, InteractionSnapshot, InteractionState,
    InteractionView, ItemId, ItemIdValidationError, PendingToggle, ServerState,
};
pub use self::request::ApiRequest;
pub use self::session::{AccessToken, RefreshToken, SessionTokens, TokenKey, TokenValidationError};
pub use self::session_store::RedundantSessionStore;
pub use self::token_refresh::{REFRESH_PATH, RefreshOutcome, TokenRefresher};

/// Convenient client result alias.
///
/// # Examples
/// ```
/// use client::domain::{ApiError, ApiResult};
///
/// fn missing() -> ApiResult<()> {
///     Err(ApiError::from_status(404, "no such post"))
/// }
/// assert!(missing().is_err());
/// ```
pub type ApiResult<T> = Result<T, ApiError>;
