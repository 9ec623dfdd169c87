//! Driving port for interaction mutations (like, repost, follow).

use async_trait::async_trait;

use crate::domain::{ApiError, InteractionKind, ItemId};

/// Tell the backend the desired state of one control.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionCommand: Send + Sync {
    /// Set `kind` on `item` to `active`.
    ///
    /// The call is idempotent from the caller's point of view: asking for the
    /// state the backend already holds is not an error the caller can act on.
    async fn set_interaction(
        &self,
        item: &ItemId,
        kind: InteractionKind,
        active: bool,
    ) -> Result<(), ApiError>;
}
