//! Cached conversation summary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::slack::types::ApiChannel;
use crate::tabular::Record;
use crate::AppError;

/// Conversation type as understood by `conversations.list`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Public channel.
    PublicChannel,
    /// Private channel.
    PrivateChannel,
    /// Multi-party direct message.
    Mpim,
    /// One-to-one direct message.
    Im,
}

impl ChannelKind {
    /// Every kind, in directory load order.
    pub const ALL: [Self; 4] = [
        Self::PublicChannel,
        Self::PrivateChannel,
        Self::Mpim,
        Self::Im,
    ];

    /// Wire name used in the `types` parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicChannel => "public_channel",
            Self::PrivateChannel => "private_channel",
            Self::Mpim => "mpim",
            Self::Im => "im",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "public_channel" => Ok(Self::PublicChannel),
            "private_channel" => Ok(Self::PrivateChannel),
            "mpim" => Ok(Self::Mpim),
            "im" => Ok(Self::Im),
            other => Err(AppError::InvalidInput(format!(
                "unknown channel type '{other}'; expected one of: public_channel, private_channel, mpim, im"
            ))),
        }
    }
}

/// Conversation summary as held in the directory cache.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Conversation ID; the cache key.
    pub id: String,
    /// Channel name, or `@handle` for direct messages.
    pub name: String,
    /// Topic text.
    pub topic: String,
    /// Purpose text.
    pub purpose: String,
    /// Number of members; at least 1.
    pub member_count: u64,
    /// Conversation type.
    pub kind: ChannelKind,
}

impl Channel {
    /// Convert a `conversations.list` entry.
    ///
    /// `peer_name` resolves a DM peer's user ID to a handle; it is consulted
    /// only when the conversation has no name of its own.
    pub fn from_api<F>(raw: &ApiChannel, kind: ChannelKind, peer_name: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = match raw.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => {
                let peer = raw.user.as_deref().unwrap_or_default();
                format!("@{}", peer_name(peer).unwrap_or_else(|| peer.to_owned()))
            }
        };

        Self {
            id: raw.id.clone(),
            name,
            topic: raw.topic.as_ref().map(|t| t.value.clone()).unwrap_or_default(),
            purpose: raw
                .purpose
                .as_ref()
                .map(|p| p.value.clone())
                .unwrap_or_default(),
            member_count: raw.num_members.filter(|n| *n > 0).unwrap_or(1),
            kind,
        }
    }
}

impl Record for Channel {
    const COLUMNS: &'static [&'static str] = &["id", "name", "topic", "purpose", "memberCount"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.topic.clone(),
            self.purpose.clone(),
            self.member_count.to_string(),
        ]
    }
}

/// A channel row in a paginated `channels_list` response.
#[derive(Debug, Clone, Copy)]
pub struct ChannelListing<'a> {
    /// The listed channel.
    pub channel: &'a Channel,
    /// Offset of the next page; empty on the last page.
    pub cursor: &'a str,
}

impl Record for ChannelListing<'_> {
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "topic", "purpose", "memberCount", "cursor"];

    fn fields(&self) -> Vec<String> {
        let mut fields = self.channel.fields();
        fields.push(self.cursor.to_owned());
        fields
    }
}
