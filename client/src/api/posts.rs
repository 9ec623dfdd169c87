//! Social feed: posts, likes, and reposts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::item_path;
use crate::domain::ports::{HttpTransport, InteractionCommand, InteractionQuery, SessionStore};
use crate::domain::{
    ApiClient, ApiError, InteractionKind, InteractionSnapshot, ItemId, ServerState,
};

const POSTS_PATH: &str = "/api/v1/posts";

/// Author summary embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    /// Backend identifier of the author.
    pub id: ItemId,
    /// Author handle.
    pub username: String,
}

/// One post in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Backend identifier.
    pub id: ItemId,
    /// Author, when the backend embeds it.
    #[serde(default)]
    pub author: Option<PostAuthor>,
    /// Post body.
    #[serde(default)]
    pub content: String,
    /// Total likes.
    #[serde(default)]
    pub likes_count: u64,
    /// Total reposts.
    #[serde(default)]
    pub reposts_count: u64,
    /// Whether the current user liked this post.
    #[serde(default)]
    pub is_liked: bool,
    /// Whether the current user reposted this post.
    #[serde(default)]
    pub is_reposted: bool,
    /// Creation timestamp as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Post {
    /// Authoritative like and repost state carried by this post.
    pub fn interaction_snapshots(&self) -> [InteractionSnapshot; 2] {
        [
            InteractionSnapshot {
                item: self.id.clone(),
                kind: InteractionKind::Like,
                state: ServerState {
                    active: self.is_liked,
                    count: self.likes_count,
                },
            },
            InteractionSnapshot {
                item: self.id.clone(),
                kind: InteractionKind::Repost,
                state: ServerState {
                    active: self.is_reposted,
                    count: self.reposts_count,
                },
            },
        ]
    }
}

/// One page of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    /// Page number that was requested.
    pub page: u32,
    /// Posts on this page.
    pub posts: Vec<Post>,
    /// Whether the backend reported further pages.
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedDto {
    Paged {
        posts: Vec<Post>,
        #[serde(default, rename = "hasMore")]
        has_more: bool,
    },
    List(Vec<Post>),
}

impl FeedDto {
    fn into_page(self, page: u32) -> FeedPage {
        match self {
            Self::Paged { posts, has_more } => FeedPage {
                page,
                posts,
                has_more,
            },
            Self::List(posts) => FeedPage {
                page,
                posts,
                has_more: false,
            },
        }
    }
}

/// Wrapper for `/api/v1/posts`.
///
/// As an [`InteractionQuery`] it snapshots the most recently requested feed
/// page (page 1 until [`PostsApi::feed`] is called).
pub struct PostsApi<T: ?Sized, S: ?Sized> {
    client: Arc<ApiClient<T, S>>,
    current_page: AtomicU32,
}

impl<T, S> PostsApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Wrap a shared client.
    pub fn new(client: Arc<ApiClient<T, S>>) -> Self {
        Self {
            client,
            current_page: AtomicU32::new(1),
        }
    }

    /// Fetch one page of the feed (1-based; 0 is treated as 1).
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client or payload decoding.
    pub async fn feed(&self, page: u32) -> Result<FeedPage, ApiError> {
        let page = page.max(1);
        self.current_page.store(page, Ordering::Relaxed);
        let dto: FeedDto = self
            .client
            .get_data(&format!("{POSTS_PATH}?page={page}"))
            .await?;
        let feed = dto.into_page(page);
        debug!(page, posts = feed.posts.len(), "feed page loaded");
        Ok(feed)
    }

    /// Fetch one post.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client or payload decoding.
    pub async fn post(&self, id: &ItemId) -> Result<Post, ApiError> {
        self.client.get_data(&item_path(POSTS_PATH, id, None)).await
    }

    /// Like `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn like(&self, id: &ItemId) -> Result<(), ApiError> {
        self.mutate(id, InteractionKind::Like, true).await
    }

    /// Remove a like from `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn unlike(&self, id: &ItemId) -> Result<(), ApiError> {
        self.mutate(id, InteractionKind::Like, false).await
    }

    /// Repost `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn repost(&self, id: &ItemId) -> Result<(), ApiError> {
        self.mutate(id, InteractionKind::Repost, true).await
    }

    /// Undo a repost of `id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn unrepost(&self, id: &ItemId) -> Result<(), ApiError> {
        self.mutate(id, InteractionKind::Repost, false).await
    }

    async fn mutate(&self, id: &ItemId, kind: InteractionKind, active: bool) -> Result<(), ApiError> {
        let path = item_path(POSTS_PATH, id, Some(kind.path_segment()));
        if active {
            self.client.post(&path, &json!({})).await?;
        } else {
            self.client.delete(&path).await?;
        }
        debug!(post = %id, kind = kind.path_segment(), active, "post interaction updated");
        Ok(())
    }
}

#[async_trait]
impl<T, S> InteractionCommand for PostsApi<T, S>
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
        match kind {
            InteractionKind::Like | InteractionKind::Repost => {
                self.mutate(item, kind, active).await
            }
            InteractionKind::Follow => Err(ApiError::invalid_request(
                "posts do not support 'follow'",
            )),
        }
    }
}

#[async_trait]
impl<T, S> InteractionQuery for PostsApi<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    async fn snapshot(&self) -> Result<Vec<InteractionSnapshot>, ApiError> {
        let page = self.current_page.load(Ordering::Relaxed);
        let feed = self.feed(page).await?;
        Ok(feed
            .posts
            .iter()
            .flat_map(Post::interaction_snapshots)
            .collect())
    }
}

/// Like and repost controls of one post, usable as both command and query
/// port.
///
/// Unlike [`PostsApi`] as a query, the snapshot comes from the post itself,
/// so it holds whichever feed page the post appears on.
pub struct PostInteractions<T: ?Sized, S: ?Sized> {
    posts: Arc<PostsApi<T, S>>,
    id: ItemId,
}

impl<T: ?Sized, S: ?Sized> PostInteractions<T, S> {
    /// Track the post `id` through `posts`.
    pub fn new(posts: Arc<PostsApi<T, S>>, id: ItemId) -> Self {
        Self { posts, id }
    }
}

#[async_trait]
impl<T, S> InteractionCommand for PostInteractions<T, S>
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
        self.posts.set_interaction(item, kind, active).await
    }
}

#[async_trait]
impl<T, S> InteractionQuery for PostInteractions<T, S>
where
    T: HttpTransport + ?Sized,
    S: SessionStore + ?Sized,
{
    async fn snapshot(&self) -> Result<Vec<InteractionSnapshot>, ApiError> {
        let post = self.posts.post(&self.id).await?;
        Ok(post.interaction_snapshots().to_vec())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the posts wrapper.
    use super::*;
    use crate::domain::{InteractionView, OptimisticInteractions};
    use crate::domain::ports::HttpMethod;
    use crate::test_support::{
        BASE_URL, MemorySessionStore, ScriptedTransport, json_response, session_store,
        text_response,
    };
    use rstest::rstest;
    use url::Url;

    type TestPosts = PostsApi<ScriptedTransport, MemorySessionStore>;

    fn api(transport: &Arc<ScriptedTransport>) -> TestPosts {
        let client = ApiClient::new(
            Url::parse(BASE_URL).expect("valid url"),
            Arc::clone(transport),
            session_store(Some("abc"), None),
        )
        .expect("client builds");
        PostsApi::new(Arc::new(client))
    }

    fn post_json(id: &str, likes: u64, liked: bool) -> serde_json::Value {
        json!({ "id": id, "content": "hi", "likesCount": likes, "isLiked": liked, "repostsCount": 1 })
    }

    #[rstest]
    #[case::paged(json!({ "data": { "posts": [post_json("p1", 2, false)], "hasMore": true } }), true)]
    #[case::double_wrapped_list(json!({ "data": { "data": [post_json("p1", 2, false)] } }), false)]
    #[tokio::test]
    async fn feed_accepts_paged_and_list_shapes(
        #[case] body: serde_json::Value,
        #[case] has_more: bool,
    ) {
        let transport = Arc::new(ScriptedTransport::new(move |_| Ok(json_response(200, &body))));

        let feed = api(&transport).feed(2).await.expect("feed loads");

        assert_eq!(feed.page, 2);
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].likes_count, 2);
        assert_eq!(feed.has_more, has_more);
        assert_eq!(transport.requests()[0].url.query(), Some("page=2"));
    }

    #[rstest]
    #[case(InteractionKind::Like, true, HttpMethod::Post, "/api/v1/posts/p1/like")]
    #[case(InteractionKind::Like, false, HttpMethod::Delete, "/api/v1/posts/p1/like")]
    #[case(InteractionKind::Repost, true, HttpMethod::Post, "/api/v1/posts/p1/repost")]
    #[case(InteractionKind::Repost, false, HttpMethod::Delete, "/api/v1/posts/p1/repost")]
    #[tokio::test]
    async fn interactions_map_to_verbs_and_paths(
        #[case] kind: InteractionKind,
        #[case] active: bool,
        #[case] method: HttpMethod,
        #[case] path: &str,
    ) {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(200, &json!({ "data": null })))
        }));
        let id = ItemId::new("p1").expect("valid id");

        api(&transport)
            .set_interaction(&id, kind, active)
            .await
            .expect("mutation succeeds");

        let sent = transport.requests();
        assert_eq!(sent[0].method, method);
        assert_eq!(sent[0].url.path(), path);
    }

    #[tokio::test]
    async fn snapshot_emits_like_and_repost_per_post() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(
                200,
                &json!({ "data": [post_json("p1", 4, true), post_json("p2", 0, false)] }),
            ))
        }));

        let snapshots = api(&transport).snapshot().await.expect("snapshot loads");

        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[0].kind, InteractionKind::Like);
        assert_eq!(snapshots[0].state, ServerState { active: true, count: 4 });
        assert_eq!(snapshots[1].kind, InteractionKind::Repost);
    }

    #[tokio::test]
    async fn failed_like_is_reverted_then_reconciled_from_the_feed() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.path().ends_with("/like") {
                return Ok(text_response(500, "database unavailable"));
            }
            Ok(json_response(200, &json!({ "data": [post_json("p1", 5, false)] })))
        }));
        let posts = Arc::new(api(&transport));
        let interactions = OptimisticInteractions::new(Arc::clone(&posts), Arc::clone(&posts));
        let id = ItemId::new("p1").expect("valid id");
        interactions.refresh().await.expect("initial fetch");

        let error = interactions
            .toggle(&id, InteractionKind::Like)
            .await
            .expect_err("like fails");
        interactions.settle().await;

        assert_eq!(error.to_string(), "database unavailable");
        let view = interactions.view(&id, InteractionKind::Like);
        assert!(!view.active);
        assert_eq!(view.count, 5);
        assert_eq!(
            transport
                .requests()
                .iter()
                .filter(|request| request.url.path() == POSTS_PATH)
                .count(),
            2,
            "initial fetch plus one reconciliation"
        );
    }

    #[tokio::test]
    async fn single_post_toggle_starts_from_the_post_state() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.path().ends_with("/like") {
                return Ok(json_response(200, &json!({ "data": null })));
            }
            Ok(json_response(200, &json!({ "data": post_json("p9", 5, true) })))
        }));
        let id = ItemId::new("p9").expect("valid id");
        let post = Arc::new(PostInteractions::new(Arc::new(api(&transport)), id.clone()));
        let interactions = OptimisticInteractions::new(Arc::clone(&post), Arc::clone(&post));
        interactions.refresh().await.expect("post loads");

        let view = interactions
            .toggle(&id, InteractionKind::Like)
            .await
            .expect("unlike succeeds");

        assert_eq!(view, InteractionView { active: false, count: 4 });
        let sent = transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url.path(), "/api/v1/posts/p9");
        assert_eq!(sent[1].method, HttpMethod::Delete);
        assert_eq!(sent[1].url.path(), "/api/v1/posts/p9/like");
    }
}
