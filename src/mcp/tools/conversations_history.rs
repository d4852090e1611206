//! `conversations_history` MCP tool handler.
//!
//! Fetches one page of channel history and renders it as a message table.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Deserialize;
use tracing::{info, info_span, Instrument};

use super::message_rows;
use super::util::{
    lenient_bool, lenient_string, non_empty, parse_input, render_outcome, resolve_channel,
    text_result,
};
use crate::limit::parse_limit;
use crate::mcp::handler::{AppState, SlackMcpServer};
use crate::slack::types::HistoryRequest;
use crate::tabular::to_csv;
use crate::Result;

/// Tool name.
pub const NAME: &str = "conversations_history";

#[derive(Debug, Deserialize)]
struct HistoryInput {
    channel_id: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    include_activity_messages: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    cursor: String,
    #[serde(default = "default_limit", deserialize_with = "lenient_string")]
    limit: String,
}

fn default_limit() -> String {
    "1d".to_owned()
}

/// Handle the `conversations_history` tool call.
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
        let input: HistoryInput = parse_input(NAME, args)?;
        run(state, input).await
    };
    render_outcome(NAME, outcome.await)
}

async fn run(state: &AppState, input: HistoryInput) -> Result<String> {
    let span = info_span!(
        "conversations_history",
        channel = %input.channel_id,
        limit = %input.limit,
    );

    async move {
        let slack = state.slack()?;
        let channel_id = resolve_channel(state, &input.channel_id).await?;
        let window = parse_limit(&input.limit);

        let page = slack
            .conversations_history(HistoryRequest {
                channel: channel_id.clone(),
                limit: window.limit,
                cursor: non_empty(&input.cursor),
                oldest: window.oldest,
                latest: window.latest,
                inclusive: false,
            })
            .await?;

        let directory = state.directory().await?;
        let rows = message_rows(
            &page.messages,
            &directory,
            &channel_id,
            &page.next_cursor,
            input.include_activity_messages,
        );
        info!(%channel_id, fetched = page.messages.len(), returned = rows.len(), "history fetched");

        to_csv(&rows)
    }
    .instrument(span)
    .await
}
