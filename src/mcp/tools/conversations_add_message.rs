//! `conversations_add_message` MCP tool handler.
//!
//! Posting is off unless enabled by configuration. When enabled, the
//! target channel must pass the optional allowlist, and the conversation
//! can be marked read at the new message afterwards.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Deserialize;
use tracing::{info, info_span, warn, Instrument};

use super::util::{non_empty, parse_input, render_outcome, resolve_channel, text_result};
use crate::config::ADD_MESSAGE_TOOL_ENV;
use crate::mcp::handler::{AppState, SlackMcpServer};
use crate::slack::types::PostMessageRequest;
use crate::{AppError, Result};

/// Tool name.
pub const NAME: &str = "conversations_add_message";

const MARKDOWN: &str = "text/markdown";
const PLAIN: &str = "text/plain";

#[derive(Debug, Deserialize)]
struct AddMessageInput {
    channel_id: String,
    #[serde(default)]
    payload: String,
    #[serde(default)]
    thread_ts: String,
    #[serde(default = "default_content_type")]
    content_type: String,
}

fn default_content_type() -> String {
    MARKDOWN.to_owned()
}

/// Handle the `conversations_add_message` tool call.
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
        if !state.config.posting.enabled {
            return Err(AppError::Disabled(format!(
                "Message posting is disabled. Set {ADD_MESSAGE_TOOL_ENV} to enable."
            )));
        }
        let input: AddMessageInput = parse_input(NAME, args)?;
        run(state, input).await
    };
    render_outcome(NAME, outcome.await)
}

async fn run(state: &AppState, input: AddMessageInput) -> Result<String> {
    let span = info_span!(
        "conversations_add_message",
        channel = %input.channel_id,
        content_type = %input.content_type,
        in_thread = !input.thread_ts.is_empty(),
    );

    async move {
        let posting = &state.config.posting;

        let mrkdwn = match input.content_type.trim() {
            MARKDOWN => true,
            PLAIN => false,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unsupported content_type '{other}'; expected {MARKDOWN} or {PLAIN}"
                )));
            }
        };
        if input.payload.trim().is_empty() {
            return Err(AppError::InvalidInput("payload must not be empty".into()));
        }

        let slack = state.slack()?;
        let channel_id = resolve_channel(state, &input.channel_id).await?;
        if !posting.allows(&channel_id) {
            return Err(AppError::Disabled(format!(
                "posting to channel {channel_id} is not allowed; permitted channels are set by {ADD_MESSAGE_TOOL_ENV}"
            )));
        }

        let posted = slack
            .post_message(PostMessageRequest {
                channel: channel_id.clone(),
                text: input.payload,
                thread_ts: non_empty(&input.thread_ts),
                mrkdwn,
                unfurl_links: posting.unfurl_links,
                unfurl_media: posting.unfurl_links,
            })
            .await?;
        info!(%channel_id, ts = %posted.ts, "message posted");

        if posting.mark_as_read && !posted.ts.is_empty() {
            if let Err(err) = slack.mark_conversation(channel_id.clone(), posted.ts.clone()).await {
                warn!(%channel_id, %err, "failed to mark conversation read");
            }
        }

        Ok(format!("Message posted successfully. Timestamp: {}", posted.ts))
    }
    .instrument(span)
    .await
}
