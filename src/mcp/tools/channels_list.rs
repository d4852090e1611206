//! `channels_list` MCP tool handler.
//!
//! Lists conversations from the directory cache with type filtering,
//! optional popularity sort, and offset pagination.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Deserialize;
use tracing::{debug, info_span, warn, Instrument};

use super::util::{
    lenient_i64, lenient_string, non_empty, parse_input, render_outcome, text_result,
};
use crate::directory::Directory;
use crate::mcp::handler::{AppState, SlackMcpServer};
use crate::models::channel::{Channel, ChannelKind, ChannelListing};
use crate::tabular::to_csv;
use crate::{AppError, Result};

/// Tool name.
pub const NAME: &str = "channels_list";

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;
const SORT_POPULARITY: &str = "popularity";

#[derive(Debug, Deserialize)]
struct ChannelsListInput {
    channel_types: String,
    #[serde(default)]
    sort: String,
    #[serde(default = "default_limit", deserialize_with = "lenient_i64")]
    limit: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    cursor: String,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Handle the `channels_list` tool call.
///
/// # Errors
///
/// Never fails at the protocol level; failures become `Error:` text.
pub async fn handle(
    context: ToolCallContext<'_, SlackMcpServer>,
) -> std::result::Result<CallToolResult, rmcp::ErrorData> {
    let state = Arc::clone(context.service.state());
    Ok(text_result(execute(&state, context.arguments).await))
}

/// Run the tool against `state` and return the text shown to the caller.
pub async fn execute(state: &AppState, args: Option<JsonObject>) -> String {
    let outcome = async {
        let input: ChannelsListInput = parse_input(NAME, args)?;
        run(state, input).await
    };
    render_outcome(NAME, outcome.await)
}

async fn run(state: &AppState, input: ChannelsListInput) -> Result<String> {
    let span = info_span!(
        "channels_list",
        channel_types = %input.channel_types,
        sort = %input.sort,
    );

    async move {
        let kinds = parse_kinds(&input.channel_types)?;
        let offset = parse_offset(&input.cursor)?;
        let directory = state.directory().await?;
        list_page(&directory, &kinds, &input.sort, input.limit, offset)
    }
    .instrument(span)
    .await
}

/// Parse a comma-separated type list, ignoring unknown entries.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` when no entry names a known type.
pub fn parse_kinds(channel_types: &str) -> Result<Vec<ChannelKind>> {
    let mut kinds = Vec::new();
    for entry in channel_types.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.parse::<ChannelKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(_) => warn!(entry, "ignoring unknown channel type"),
        }
    }

    if kinds.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "channel_types '{channel_types}' names no known type; expected any of: \
             public_channel, private_channel, mpim, im"
        )));
    }
    Ok(kinds)
}

fn parse_offset(cursor: &str) -> Result<usize> {
    match non_empty(cursor) {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("invalid cursor '{raw}'"))),
    }
}

/// Render one page of the filtered, optionally sorted channel list.
///
/// `limit` is clamped to `1..=1000`. Every row's cursor column carries the
/// next offset when more channels remain, and is empty otherwise.
///
/// # Errors
///
/// Returns `AppError::Internal` if CSV encoding fails.
pub fn list_page(
    directory: &Directory,
    kinds: &[ChannelKind],
    sort: &str,
    limit: i64,
    offset: usize,
) -> Result<String> {
    let mut channels: Vec<&Channel> = directory
        .channels()
        .filter(|c| kinds.contains(&c.kind))
        .collect();

    match sort.trim() {
        "" => {}
        SORT_POPULARITY => channels.sort_by(|a, b| b.member_count.cmp(&a.member_count)),
        other => warn!(sort = other, "ignoring unknown sort order"),
    }

    let limit = usize::try_from(limit.clamp(1, MAX_LIMIT)).unwrap_or(1);
    let total = channels.len();
    let end = offset.saturating_add(limit).min(total);
    let next = if end < total { end.to_string() } else { String::new() };
    debug!(total, offset, limit, "paginating channel list");

    let rows: Vec<ChannelListing<'_>> = channels
        .get(offset..end)
        .unwrap_or_default()
        .iter()
        .map(|&channel| ChannelListing {
            channel,
            cursor: &next,
        })
        .collect();

    to_csv(&rows)
}
