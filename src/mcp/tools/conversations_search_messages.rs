//! `conversations_search_messages` MCP tool handler.
//!
//! Builds a Slack search query from free text plus filter parameters and
//! renders one page of matches. A message link in `search_query` short
//! circuits the search and returns the linked message.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Deserialize;
use tracing::{debug, info, info_span, warn, Instrument};

use super::util::{
    lenient_bool, lenient_i64, lenient_string, non_empty, parse_input, render_outcome, text_result,
};
use crate::directory::resolver::{resolve_channel_id, resolve_user_id, user_search_reference};
use crate::directory::Directory;
use crate::mcp::handler::{AppState, SlackMcpServer};
use crate::models::message::Message;
use crate::slack::types::{HistoryRequest, RepliesRequest, SearchRequest};
use crate::tabular::to_csv;
use crate::{AppError, Result};

/// Tool name.
pub const NAME: &str = "conversations_search_messages";

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

static PERMALINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^https://[A-Za-z0-9.-]+\.slack\.com/archives/([CDG][A-Z0-9]+)/p(\d{10})(\d{6})(?:[/?#].*)?$",
    )
    .ok()
});

/// Search text and filters accepted by the tool.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchInput {
    /// Free text, or a Slack message link.
    pub search_query: String,
    /// Channel ID or `#name`.
    pub filter_in_channel: String,
    /// DM or group DM ID or `@name`.
    pub filter_in_im_or_mpim: String,
    /// Conversations with this user.
    pub filter_users_with: String,
    /// Messages sent by this user.
    pub filter_users_from: String,
    /// `before:` date.
    pub filter_date_before: String,
    /// `after:` date.
    pub filter_date_after: String,
    /// `on:` date.
    pub filter_date_on: String,
    /// `during:` period such as `july` or `2024`.
    pub filter_date_during: String,
    /// Restrict to thread messages.
    #[serde(deserialize_with = "lenient_bool")]
    pub filter_threads_only: bool,
    /// Page number from a previous result.
    #[serde(deserialize_with = "lenient_string")]
    pub cursor: String,
    /// Results per page.
    #[serde(deserialize_with = "lenient_i64")]
    pub limit: i64,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            filter_in_channel: String::new(),
            filter_in_im_or_mpim: String::new(),
            filter_users_with: String::new(),
            filter_users_from: String::new(),
            filter_date_before: String::new(),
            filter_date_after: String::new(),
            filter_date_on: String::new(),
            filter_date_during: String::new(),
            filter_threads_only: false,
            cursor: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A message located by a Slack link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permalink {
    /// Conversation ID.
    pub channel_id: String,
    /// Message timestamp.
    pub ts: String,
    /// Parent thread timestamp, when the link points into a thread.
    pub thread_ts: Option<String>,
}

/// Parse `https://<team>.slack.com/archives/<channel>/p<16 digits>`.
///
/// The `p` segment encodes the timestamp with its decimal point removed:
/// `p1716932719000123` is `1716932719.000123`.
#[must_use]
pub fn parse_permalink(text: &str) -> Option<Permalink> {
    let text = text.trim();
    let caps = PERMALINK_RE.as_ref()?.captures(text)?;

    let thread_ts = text.split_once('?').and_then(|(_, query)| {
        query
            .split(['&', '#'])
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "thread_ts")
            .map(|(_, v)| v.to_owned())
            .filter(|v| !v.is_empty())
    });

    Some(Permalink {
        channel_id: caps[1].to_owned(),
        ts: format!("{}.{}", &caps[2], &caps[3]),
        thread_ts,
    })
}

/// Assemble the Slack search query.
///
/// Parts join with single spaces in a fixed order: free text, channel
/// filters as `in:<id>`, `from:`, `with:`, the four date operators, and
/// `is:thread`. Channel filters that do not resolve are left out. User
/// handles known to the directory become `<@ID>` mentions.
#[must_use]
pub fn build_query(input: &SearchInput, directory: &Directory) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(text) = non_empty(&input.search_query) {
        parts.push(text);
    }

    for filter in [&input.filter_in_channel, &input.filter_in_im_or_mpim] {
        let Some(token) = non_empty(filter) else {
            continue;
        };
        match resolve_channel_id(directory, &token) {
            Some(id) => parts.push(format!("in:{id}")),
            None => warn!(filter = %token, "channel filter did not resolve; skipping"),
        }
    }

    if let Some(user) = non_empty(&input.filter_users_from) {
        parts.push(format!("from:{}", search_user(directory, &user)));
    }
    if let Some(user) = non_empty(&input.filter_users_with) {
        parts.push(format!("with:{}", search_user(directory, &user)));
    }

    for (operator, value) in [
        ("after", &input.filter_date_after),
        ("before", &input.filter_date_before),
        ("on", &input.filter_date_on),
        ("during", &input.filter_date_during),
    ] {
        if let Some(value) = non_empty(value) {
            parts.push(format!("{operator}:{value}"));
        }
    }

    if input.filter_threads_only {
        parts.push("is:thread".to_owned());
    }

    parts.join(" ")
}

fn search_user(directory: &Directory, token: &str) -> String {
    match resolve_user_id(directory, token) {
        Some(user_id) => user_search_reference(&user_id),
        None => user_search_reference(token),
    }
}

fn parse_page(cursor: &str) -> Result<u32> {
    match non_empty(cursor) {
        None => Ok(1),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::InvalidInput(format!("invalid cursor '{raw}'"))),
        },
    }
}

/// Handle the `conversations_search_messages` tool call.
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
        let input: SearchInput = parse_input(NAME, args)?;
        run(state, input).await
    };
    render_outcome(NAME, outcome.await)
}

async fn run(state: &AppState, input: SearchInput) -> Result<String> {
    let span = info_span!("conversations_search_messages", page = %input.cursor);

    async move {
        let slack = state.slack()?;

        if let Some(link) = parse_permalink(&input.search_query) {
            return fetch_linked(state, &link).await;
        }

        let page = parse_page(&input.cursor)?;
        let count = u32::try_from(input.limit.clamp(1, MAX_LIMIT)).unwrap_or(1);
        let directory = state.directory().await?;

        let query = build_query(&input, &directory);
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "search_query or at least one filter is required".into(),
            ));
        }
        debug!(%query, count, page, "searching messages");

        let result = slack
            .search_messages(SearchRequest { query, count, page })
            .await?;

        let next = if result.page < result.page_count {
            (result.page + 1).to_string()
        } else {
            String::new()
        };

        let rows: Vec<Message> = result
            .matches
            .iter()
            .map(|m| {
                let channel_id = m.channel.as_ref().map(|c| c.id.as_str()).unwrap_or_default();
                Message::from_api(m, &directory, channel_id, &next)
            })
            .collect();
        info!(matches = rows.len(), page = result.page, pages = result.page_count, "search completed");

        to_csv(&rows)
    }
    .instrument(span)
    .await
}

async fn fetch_linked(state: &AppState, link: &Permalink) -> Result<String> {
    let slack = state.slack()?;
    info!(channel_id = %link.channel_id, ts = %link.ts, "fetching linked message");

    let page = match &link.thread_ts {
        Some(thread_ts) if *thread_ts != link.ts => {
            slack
                .conversations_replies(RepliesRequest {
                    channel: link.channel_id.clone(),
                    ts: thread_ts.clone(),
                    limit: 1,
                    cursor: None,
                    oldest: Some(link.ts.clone()),
                    latest: Some(link.ts.clone()),
                    inclusive: true,
                })
                .await?
        }
        _ => {
            slack
                .conversations_history(HistoryRequest {
                    channel: link.channel_id.clone(),
                    limit: 1,
                    cursor: None,
                    oldest: Some(link.ts.clone()),
                    latest: Some(link.ts.clone()),
                    inclusive: true,
                })
                .await?
        }
    };

    let directory = state.directory().await?;
    let rows: Vec<Message> = page
        .messages
        .iter()
        .filter(|m| m.ts == link.ts)
        .map(|m| Message::from_api(m, &directory, &link.channel_id, ""))
        .collect();

    to_csv(&rows)
}
