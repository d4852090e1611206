//! MCP tool handlers.

pub mod channels_list;
pub mod conversations_add_message;
pub mod conversations_history;
pub mod conversations_replies;
pub mod conversations_search_messages;
pub mod util;

use crate::directory::Directory;
use crate::models::message::{is_activity, Message};
use crate::slack::types::ApiMessage;

/// Convert an API page into rows, dropping activity messages unless asked.
pub(crate) fn message_rows(
    raw: &[ApiMessage],
    directory: &Directory,
    channel_id: &str,
    cursor: &str,
    include_activity: bool,
) -> Vec<Message> {
    raw.iter()
        .filter(|m| include_activity || !is_activity(m))
        .map(|m| Message::from_api(m, directory, channel_id, cursor))
        .collect()
}
