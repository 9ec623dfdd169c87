//! Coaching chat completions with caller-driven cancellation.
//!
//! A completion is a pending request plus a [`StopHandle`]. Stopping aborts
//! the in-flight request and resolves the completion to
//! [`ChatReply::Stopped`], which callers render like any other reply.

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{AbortHandle, Abortable, Aborted, BoxFuture};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{HttpTransport, SessionStore};
use crate::domain::{ApiClient, ApiError};

const CHAT_PATH: &str = "/api/v1/chat";

/// Text shown in place of a reply the user stopped.
pub const STOPPED_MESSAGE: &str = "generation stopped";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions framing the conversation.
    System,
    /// The person using the app.
    User,
    /// The coaching model.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Message authored by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Final state of a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// The backend answered.
    Completed(ChatMessage),
    /// The caller stopped generation first.
    Stopped,
}

impl ChatReply {
    /// Text to display for this reply.
    pub fn text(&self) -> &str {
        match self {
            Self::Completed(message) => &message.content,
            Self::Stopped => STOPPED_MESSAGE,
        }
    }

    /// The assistant message, treating a stop as [`ApiError::Aborted`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Aborted`] for [`ChatReply::Stopped`].
    pub fn into_message(self) -> Result<ChatMessage, ApiError> {
        match self {
            Self::Completed(message) => Ok(message),
            Self::Stopped => Err(ApiError::Aborted),
        }
    }
}

/// Cancels one pending completion. Cloneable; stopping twice is harmless.
#[derive(Debug, Clone)]
pub struct StopHandle(AbortHandle);

impl StopHandle {
    /// Abort the in-flight request.
    pub fn stop(&self) {
        self.0.abort();
    }

    /// Whether [`Self::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.0.is_aborted()
    }
}

/// Pending completion returned by [`ChatApi::complete`].
pub struct ChatCompletion {
    stop: StopHandle,
    reply: BoxFuture<'static, Result<ChatReply, ApiError>>,
}

impl fmt::Debug for ChatCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletion")
            .field("stopped", &self.stop.is_stopped())
            .finish_non_exhaustive()
    }
}

impl ChatCompletion {
    /// Handle that stops this completion.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Wait for the reply.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client unless the completion was
    /// stopped first.
    pub async fn reply(self) -> Result<ChatReply, ApiError> {
        self.reply.await
    }
}

#[derive(Serialize)]
struct ChatRequestDto {
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChatResponseDto {
    Wrapped { message: ChatMessage },
    Bare(ChatMessage),
    Reply { reply: String },
}

impl From<ChatResponseDto> for ChatMessage {
    fn from(value: ChatResponseDto) -> Self {
        match value {
            ChatResponseDto::Wrapped { message } | ChatResponseDto::Bare(message) => message,
            ChatResponseDto::Reply { reply } => Self {
                role: ChatRole::Assistant,
                content: reply,
            },
        }
    }
}

/// Wrapper for `/api/v1/chat`.
pub struct ChatApi<T: ?Sized, S: ?Sized> {
    client: Arc<ApiClient<T, S>>,
}

impl<T, S> ChatApi<T, S>
where
    T: HttpTransport + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
{
    /// Wrap a shared client.
    pub fn new(client: Arc<ApiClient<T, S>>) -> Self {
        Self { client }
    }

    /// Start a completion for `messages`.
    ///
    /// The request is sent when the returned completion is first awaited.
    pub fn complete(&self, messages: Vec<ChatMessage>) -> ChatCompletion {
        let (handle, registration) = AbortHandle::new_pair();
        let client = Arc::clone(&self.client);
        let request = async move {
            let body = ChatRequestDto { messages };
            let response: ChatResponseDto = client.post_data(CHAT_PATH, &body).await?;
            Ok::<_, ApiError>(ChatMessage::from(response))
        };
        let reply = async move {
            match Abortable::new(request, registration).await {
                Ok(result) => result.map(ChatReply::Completed),
                Err(Aborted) => {
                    debug!("chat completion stopped by caller");
                    Ok(ChatReply::Stopped)
                }
            }
        }
        .boxed();
        ChatCompletion {
            stop: StopHandle(handle),
            reply,
        }
    }
}
