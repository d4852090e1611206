//! Slack Web API request and response shapes.
//!
//! Responses are deserialized defensively: every field the server reads is
//! optional or defaulted, so a missing key becomes an empty string or zero
//! instead of a decode failure.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity returned by `auth.test`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Workspace display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,
    /// Workspace ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_id: String,
    /// Authenticated user handle.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    /// Authenticated user ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
}

/// Nested profile object on a `users.list` member.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiUserProfile {
    /// Profile-level real name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub real_name: String,
}

/// A member entry from `users.list`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiUser {
    /// User ID (`U…` / `W…`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Handle.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Top-level real name, often empty for bots.
    #[serde(default, deserialize_with = "null_as_default")]
    pub real_name: String,
    /// Deactivated account flag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted: bool,
    /// Profile block.
    #[serde(default)]
    pub profile: Option<ApiUserProfile>,
}

/// `{ "value": … }` wrapper used for channel topic and purpose.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiTextValue {
    /// Text content.
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// A conversation entry from `conversations.list`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiChannel {
    /// Conversation ID (`C…`, `G…`, `D…`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Channel name; absent for direct messages.
    #[serde(default)]
    pub name: Option<String>,
    /// DM peer user ID.
    #[serde(default)]
    pub user: Option<String>,
    /// Channel topic.
    #[serde(default)]
    pub topic: Option<ApiTextValue>,
    /// Channel purpose.
    #[serde(default)]
    pub purpose: Option<ApiTextValue>,
    /// Member count; omitted for DMs.
    #[serde(default)]
    pub num_members: Option<u64>,
}

/// A single emoji reaction on a message.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiReaction {
    /// Emoji name without colons.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Number of users who reacted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

/// Channel reference embedded in `search.messages` matches.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiChannelRef {
    /// Conversation ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Conversation name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A message from history, replies, or search results.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    /// Message timestamp, doubling as its ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
    /// Author user ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    /// Message subtype such as `channel_join`.
    #[serde(default)]
    pub subtype: Option<String>,
    /// Parent thread timestamp.
    #[serde(default, deserialize_with = "null_as_default")]
    pub thread_ts: String,
    /// Message text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Emoji reactions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: Vec<ApiReaction>,
    /// Conversation, present on search matches only.
    #[serde(default)]
    pub channel: Option<ApiChannelRef>,
}

/// One page of history or replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    /// Messages on this page, newest first for history.
    pub messages: Vec<ApiMessage>,
    /// Cursor for the next page; empty when exhausted.
    pub next_cursor: String,
}

/// One page of `search.messages` matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Matching messages.
    pub matches: Vec<ApiMessage>,
    /// Current page number (1-based).
    pub page: u32,
    /// Total number of pages.
    pub page_count: u32,
}

/// Parameters for `conversations.history`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Conversation ID.
    pub channel: String,
    /// Maximum number of messages.
    pub limit: u32,
    /// Pagination cursor.
    pub cursor: Option<String>,
    /// Lower time bound (Unix seconds).
    pub oldest: Option<String>,
    /// Upper time bound (Unix seconds).
    pub latest: Option<String>,
    /// Include messages exactly at `oldest`/`latest`.
    pub inclusive: bool,
}

/// Parameters for `conversations.replies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepliesRequest {
    /// Conversation ID.
    pub channel: String,
    /// Parent message timestamp.
    pub ts: String,
    /// Maximum number of messages.
    pub limit: u32,
    /// Pagination cursor.
    pub cursor: Option<String>,
    /// Lower time bound (Unix seconds).
    pub oldest: Option<String>,
    /// Upper time bound (Unix seconds).
    pub latest: Option<String>,
    /// Include messages exactly at `oldest`/`latest`.
    pub inclusive: bool,
}

/// Parameters for `search.messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query in Slack search syntax.
    pub query: String,
    /// Results per page.
    pub count: u32,
    /// 1-based page number.
    pub page: u32,
}

/// JSON body for `chat.postMessage`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PostMessageRequest {
    /// Conversation ID.
    pub channel: String,
    /// Message text.
    pub text: String,
    /// Reply into this thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Render Slack markdown.
    pub mrkdwn: bool,
    /// Unfurl text links.
    pub unfurl_links: bool,
    /// Unfurl media links.
    pub unfurl_media: bool,
}

/// Result of a successful `chat.postMessage`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PostedMessage {
    /// Conversation the message landed in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel: String,
    /// Timestamp of the new message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
}
