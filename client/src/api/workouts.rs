//! Workout log CRUD.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::item_path;
use crate::domain::ports::{HttpTransport, SessionStore};
use crate::domain::{ApiClient, ApiError, ItemId};

const WORKOUTS_PATH: &str = "/api/v1/workouts";

/// One exercise within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Exercise name.
    pub name: String,
    /// Number of sets.
    #[serde(default)]
    pub sets: u32,
    /// Repetitions per set.
    #[serde(default)]
    pub reps: u32,
    /// Load in kilograms, if weighted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

/// Workout as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Backend identifier.
    pub id: ItemId,
    /// Short title.
    pub title: String,
    /// Duration in minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// When the workout happened, as sent by the backend.
    #[serde(default)]
    pub performed_at: Option<String>,
    /// Exercises performed.
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// Fields sent when creating or replacing a workout.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    /// Short title.
    pub title: String,
    /// Duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the workout happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_at: Option<String>,
    /// Exercises performed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
}

impl WorkoutDraft {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::invalid_request("workout title must not be empty"));
        }
        Ok(())
    }
}

/// Wrapper for `/api/v1/workouts`.
pub struct WorkoutsApi<T: ?Sized, S: ?Sized> {
    client: Arc<ApiClient<T, S>>,
}

impl<T, S> WorkoutsApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Wrap a shared client.
    pub fn new(client: Arc<ApiClient<T, S>>) -> Self {
        Self { client }
    }

    /// All workouts of the current user.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client or payload decoding.
    pub async fn list(&self) -> Result<Vec<Workout>, ApiError> {
        self.client.get_data(WORKOUTS_PATH).await
    }

    /// One workout by id.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client or payload decoding.
    pub async fn get(&self, id: &ItemId) -> Result<Workout, ApiError> {
        self.client.get_data(&item_path(WORKOUTS_PATH, id, None)).await
    }

    /// Create a workout.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] for a blank title; otherwise propagates
    /// [`ApiError`] from the client or payload decoding.
    pub async fn create(&self, draft: &WorkoutDraft) -> Result<Workout, ApiError> {
        draft.validate()?;
        let workout: Workout = self.client.post_data(WORKOUTS_PATH, draft).await?;
        debug!(workout = %workout.id, "workout created");
        Ok(workout)
    }

    /// Replace a workout.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn update(&self, id: &ItemId, draft: &WorkoutDraft) -> Result<Workout, ApiError> {
        draft.validate()?;
        self.client
            .put_data(&item_path(WORKOUTS_PATH, id, None), draft)
            .await
    }

    /// Delete a workout.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn delete(&self, id: &ItemId) -> Result<(), ApiError> {
        self.client.delete(&item_path(WORKOUTS_PATH, id, None)).await?;
        debug!(workout = %id, "workout deleted");
        Ok(())
    }
}
