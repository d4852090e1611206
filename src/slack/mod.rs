//! Slack Web API access.
//!
//! [`SlackApi`] is the seam between tool handlers and Slack: the directory
//! cache and every tool talk to it, the production implementation is
//! [`client::SlackWebClient`], and tests substitute an in-process fake.

pub mod client;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use crate::models::channel::ChannelKind;
use crate::Result;

use self::types::{
    ApiChannel, ApiUser, AuthIdentity, HistoryRequest, MessagePage, PostMessageRequest,
    PostedMessage, RepliesRequest, SearchPage, SearchRequest,
};

/// Boxed future returned by [`SlackApi`] methods.
pub type SlackFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Slack Web API operations used by the server.
///
/// Every method performs one logical request (list methods follow
/// pagination cursors internally). Errors are
/// [`AppError::Slack`](crate::AppError::Slack) carrying the Slack error code,
/// e.g. `channel_not_found`.
pub trait SlackApi: Send + Sync {
    /// `auth.test`: validate the token and report the workspace.
    fn auth_test(&self) -> SlackFuture<'_, AuthIdentity>;

    /// `users.list`: every workspace member, deleted accounts included.
    fn list_users(&self) -> SlackFuture<'_, Vec<ApiUser>>;

    /// `conversations.list` for a single conversation type.
    fn list_conversations(&self, kind: ChannelKind) -> SlackFuture<'_, Vec<ApiChannel>>;

    /// `conversations.history`: one page of channel messages.
    fn conversations_history(&self, request: HistoryRequest) -> SlackFuture<'_, MessagePage>;

    /// `conversations.replies`: one page of a thread.
    fn conversations_replies(&self, request: RepliesRequest) -> SlackFuture<'_, MessagePage>;

    /// `search.messages`: one page of search matches.
    fn search_messages(&self, request: SearchRequest) -> SlackFuture<'_, SearchPage>;

    /// `chat.postMessage`.
    fn post_message(&self, request: PostMessageRequest) -> SlackFuture<'_, PostedMessage>;

    /// `conversations.mark`: move the read cursor to `ts`.
    fn mark_conversation(&self, channel: String, ts: String) -> SlackFuture<'_, ()>;
}
