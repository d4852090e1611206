//! Shared utilities for MCP tool handlers.

use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{error, warn};

use crate::directory::resolver::{channel_id_or_raw, is_conversation_id};
use crate::mcp::handler::AppState;
use crate::{AppError, Result};

/// Decode tool arguments into a typed input struct.
///
/// Missing arguments decode as an empty object so that tools whose
/// parameters all have defaults can be called bare.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` naming the tool when decoding fails.
pub fn parse_input<T: DeserializeOwned>(tool: &str, args: Option<JsonObject>) -> Result<T> {
    let value = serde_json::Value::Object(args.unwrap_or_default());
    serde_json::from_value(value)
        .map_err(|err| AppError::InvalidInput(format!("invalid {tool} parameters: {err}")))
}

/// Accept a boolean sent as JSON `true`/`false`, `0`/`1`, or a string.
///
/// # Errors
///
/// Rejects values that do not read as a boolean.
pub fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(flag),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(D::Error::custom(format!("expected a boolean, got {n}"))),
        },
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(D::Error::custom(format!("expected a boolean, got '{other}'"))),
        },
        other => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

/// Accept an integer sent as a JSON number or a numeric string.
///
/// # Errors
///
/// Rejects fractions, non-numeric strings, and other JSON types.
pub fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
        Value::String(raw) => raw
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected an integer, got '{raw}'"))),
        other => Err(D::Error::custom(format!("expected an integer, got {other}"))),
    }
}

/// Accept a string parameter sent as a string, number, or boolean; `null`
/// reads as empty.
///
/// # Errors
///
/// Rejects arrays and objects.
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(raw) => Ok(raw),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}

/// Turn a tool outcome into the text returned to the caller.
///
/// Failures are logged here and rendered as `Error: <detail>`.
#[must_use]
pub fn render_outcome(tool: &str, outcome: Result<String>) -> String {
    match outcome {
        Ok(text) => text,
        Err(err) => {
            match &err {
                AppError::InvalidInput(_) | AppError::Disabled(_) => {
                    warn!(tool, %err, "tool call rejected");
                }
                _ => error!(tool, %err, "tool call failed"),
            }
            format!("Error: {}", err.detail())
        }
    }
}

/// Wrap tool text in a successful `CallToolResult`.
#[must_use]
pub fn text_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// Resolve a channel reference to an ID, loading the directory only when
/// the token is not already an ID.
///
/// Unresolved references come back unchanged so Slack can report them.
///
/// # Errors
///
/// Returns an error if the directory has to be loaded and loading fails.
pub async fn resolve_channel(state: &AppState, token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidInput("channel_id is required".into()));
    }
    if is_conversation_id(token) {
        return Ok(token.to_owned());
    }

    let directory = state.directory().await?;
    Ok(channel_id_or_raw(&directory, token))
}

/// Treat an empty string parameter as absent.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
