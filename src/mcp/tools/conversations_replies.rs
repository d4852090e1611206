//! `conversations_replies` MCP tool handler.

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
use crate::slack::types::RepliesRequest;
use crate::tabular::to_csv;
use crate::{AppError, Result};

/// Tool name.
pub const NAME: &str = "conversations_replies";

#[derive(Debug, Deserialize)]
struct RepliesInput {
    channel_id: String,
    thread_ts: String,
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

/// Handle the `conversations_replies` tool call.
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
        let input: RepliesInput = parse_input(NAME, args)?;
        run(state, input).await
    };
    render_outcome(NAME, outcome.await)
}

async fn run(state: &AppState, input: RepliesInput) -> Result<String> {
    let span = info_span!(
        "conversations_replies",
        channel = %input.channel_id,
        thread_ts = %input.thread_ts,
    );

    async move {
        let Some(thread_ts) = non_empty(&input.thread_ts) else {
            return Err(AppError::InvalidInput("thread_ts is required".into()));
        };

        let slack = state.slack()?;
        let channel_id = resolve_channel(state, &input.channel_id).await?;
        let window = parse_limit(&input.limit);

        let page = slack
            .conversations_replies(RepliesRequest {
                channel: channel_id.clone(),
                ts: thread_ts,
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
        info!(%channel_id, returned = rows.len(), "thread fetched");

        to_csv(&rows)
    }
    .instrument(span)
    .await
}
