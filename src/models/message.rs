//! Message rows built per API response; never stored.

use chrono::{DateTime, SecondsFormat};

use crate::directory::Directory;
use crate::slack::types::ApiMessage;
use crate::tabular::Record;

/// Subtypes dropped unless a caller asks for activity messages.
const ACTIVITY_SUBTYPES: &[&str] = &["channel_join", "channel_leave", "group_join", "group_leave"];

/// A message enriched with cached author details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message timestamp.
    pub msg_id: String,
    /// Author user ID.
    pub user_id: String,
    /// Author handle, empty when not cached.
    pub user_name: String,
    /// Author real name, empty when not cached.
    pub real_name: String,
    /// Conversation ID.
    pub channel_id: String,
    /// Parent thread timestamp.
    pub thread_ts: String,
    /// Message text.
    pub text: String,
    /// `ts` rendered as ISO-8601 UTC.
    pub time: String,
    /// Comma-joined reaction names.
    pub reactions: String,
    /// Cursor for the next page.
    pub cursor: String,
}

impl Message {
    /// Build a row from an API message, looking up its author in `directory`.
    #[must_use]
    pub fn from_api(raw: &ApiMessage, directory: &Directory, channel_id: &str, cursor: &str) -> Self {
        let (user_name, real_name) = directory
            .get_user(&raw.user)
            .map(|u| (u.user_name.clone(), u.real_name.clone()))
            .unwrap_or_default();

        Self {
            msg_id: raw.ts.clone(),
            user_id: raw.user.clone(),
            user_name,
            real_name,
            channel_id: channel_id.to_owned(),
            thread_ts: raw.thread_ts.clone(),
            text: raw.text.clone(),
            time: format_ts(&raw.ts),
            reactions: raw
                .reactions
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            cursor: cursor.to_owned(),
        }
    }
}

impl Record for Message {
    const COLUMNS: &'static [&'static str] = &[
        "msgID",
        "userID",
        "userName",
        "realName",
        "channelID",
        "ThreadTs",
        "text",
        "time",
        "reactions",
        "cursor",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.msg_id.clone(),
            self.user_id.clone(),
            self.user_name.clone(),
            self.real_name.clone(),
            self.channel_id.clone(),
            self.thread_ts.clone(),
            self.text.clone(),
            self.time.clone(),
            self.reactions.clone(),
            self.cursor.clone(),
        ]
    }
}

/// Whether a message is join/leave activity.
#[must_use]
pub fn is_activity(raw: &ApiMessage) -> bool {
    raw.subtype
        .as_deref()
        .is_some_and(|subtype| ACTIVITY_SUBTYPES.contains(&subtype))
}

/// Render a Slack `ts` (`"1716932719.000123"`) as ISO-8601 UTC.
///
/// Returns an empty string for a missing or malformed timestamp.
#[must_use]
pub fn format_ts(ts: &str) -> String {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let Ok(secs) = secs.parse::<i64>() else {
        return String::new();
    };

    let micros: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().take(6).collect();
        match format!("{digits:0<6}").parse() {
            Ok(v) => v,
            Err(_) => return String::new(),
        }
    };

    DateTime::from_timestamp(secs, micros * 1_000)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
