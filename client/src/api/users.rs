//! User profiles and follow relationships.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::item_path;
use crate::domain::ports::{HttpTransport, InteractionCommand, InteractionQuery, SessionStore};
use crate::domain::{
    ApiClient, ApiError, InteractionKind, InteractionSnapshot, ItemId, ServerState,
};

const USERS_PATH: &str = "/api/v1/users";

/// Public profile of a backend user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier.
    pub id: ItemId,
    /// Unique handle.
    pub username: String,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Number of followers.
    #[serde(default)]
    pub followers_count: u64,
    /// Number of accounts this user follows.
    #[serde(default)]
    pub following_count: u64,
    /// Whether the current user follows this profile.
    #[serde(default)]
    pub is_following: bool,
}

impl UserProfile {
    /// Name to show in listings.
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// Authoritative follow state carried by this profile.
    pub fn follow_snapshot(&self) -> InteractionSnapshot {
        InteractionSnapshot {
            item: self.id.clone(),
            kind: InteractionKind::Follow,
            state: ServerState {
                active: self.is_following,
                count: self.followers_count,
            },
        }
    }
}

/// Wrapper for `/api/v1/users`.
pub struct UsersApi<T: ?Sized, S: ?Sized> {
    client: Arc<ApiClient<T, S>>,
}

impl<T: ?Sized, S: ?Sized> Clone for UsersApi<T, S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<T, S> UsersApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Wrap a shared client.
    pub fn new(client: Arc<ApiClient<T, S>>) -> Self {
        Self { client }
    }

    /// Fetch one profile.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client or payload decoding.
    pub async fn profile(&self, id: &ItemId) -> Result<UserProfile, ApiError> {
        self.client.get_data(&item_path(USERS_PATH, id, None)).await
    }

    /// Follow `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn follow(&self, id: &ItemId) -> Result<(), ApiError> {
        let path = item_path(USERS_PATH, id, Some(InteractionKind::Follow.path_segment()));
        self.client.post(&path, &json!({})).await?;
        debug!(user = %id, "followed");
        Ok(())
    }

    /// Stop following `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn unfollow(&self, id: &ItemId) -> Result<(), ApiError> {
        let path = item_path(USERS_PATH, id, Some(InteractionKind::Follow.path_segment()));
        self.client.delete(&path).await?;
        debug!(user = %id, "unfollowed");
        Ok(())
    }

    /// Interaction source tracking the follow control of one profile.
    pub fn interactions_for(&self, id: ItemId) -> ProfileInteractions<T, S> {
        ProfileInteractions {
            users: self.clone(),
            id,
        }
    }
}

#[async_trait]
impl<T, S> InteractionCommand for UsersApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    async fn set_interaction(
        &self,
        item: &ItemId,
        kind: InteractionKind,
        active: bool,
    ) -> Result<(), ApiError> {
        match (kind, active) {
            (InteractionKind::Follow, true) => self.follow(item).await,
            (InteractionKind::Follow, false) => self.unfollow(item).await,
            (other, _) => Err(ApiError::invalid_request(format!(
                "users do not support '{}'",
                other.path_segment()
            ))),
        }
    }
}

/// Follow control of one profile, usable as both command and query port.
pub struct ProfileInteractions<T: ?Sized, S: ?Sized> {
    users: UsersApi<T, S>,
    id: ItemId,
}

#[async_trait]
impl<T, S> InteractionCommand for ProfileInteractions<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    async fn set_interaction(
        &self,
        item: &ItemId,
        kind: InteractionKind,
        active: bool,
    ) -> Result<(), ApiError> {
        self.users.set_interaction(item, kind, active).await
    }
}

#[async_trait]
impl<T, S> InteractionQuery for ProfileInteractions<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    async fn snapshot(&self) -> Result<Vec<InteractionSnapshot>, ApiError> {
        let profile = self.users.profile(&self.id).await?;
        Ok(vec![profile.follow_snapshot()])
    }
}
