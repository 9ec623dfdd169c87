//! Driving port for authoritative interaction state.

use async_trait::async_trait;

use crate::domain::{ApiError, InteractionSnapshot};

/// Fetch the authoritative state of every control a view displays.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionQuery: Send + Sync {
    /// Fresh snapshots for the displayed collection.
    async fn snapshot(&self) -> Result<Vec<InteractionSnapshot>, ApiError>;
}
