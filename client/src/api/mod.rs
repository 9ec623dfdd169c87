//! Feature API wrappers, one per backend resource.
//!
//! Each wrapper shares one [`ApiClient`](crate::domain::ApiClient), so all of
//! them benefit from the same credentials and 401 recovery. Wrappers build
//! paths and map envelopes into typed values; they never touch tokens
//! directly except where a flow creates or ends a session.

pub mod auth;
pub mod chat;
pub mod posts;
pub mod users;
pub mod workouts;

pub use self::auth::AuthApi;
pub use self::chat::{ChatApi, ChatCompletion, ChatMessage, ChatReply, ChatRole, StopHandle};
pub use self::posts::{FeedPage, Post, PostAuthor, PostInteractions, PostsApi};
pub use self::users::{ProfileInteractions, UserProfile, UsersApi};
pub use self::workouts::{Exercise, Workout, WorkoutDraft, WorkoutsApi};

use crate::domain::ItemId;

/// `{collection}/{id}` with an optional trailing segment.
fn item_path(collection: &str, id: &ItemId, segment: Option<&str>) -> String {
    match segment {
        Some(segment) => format!("{collection}/{id}/{segment}"),
        None => format!("{collection}/{id}"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for shared path helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "/api/v1/posts/42")]
    #[case(Some("like"), "/api/v1/posts/42/like")]
    fn builds_item_paths(#[case] segment: Option<&str>, #[case] expected: &str) {
        let id = ItemId::new("42").expect("valid id");
        assert_eq!(item_path("/api/v1/posts", &id, segment), expected);
    }
}
