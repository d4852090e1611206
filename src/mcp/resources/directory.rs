//! `slack://workspace/channels` and `slack://workspace/users` MCP resources.
//!
//! Full CSV dumps of the directory cache, loading it on first read.

use rmcp::model::{
    Annotated, ListResourcesResult, RawResource, ReadResourceResult, ResourceContents,
};
use tracing::info;

use crate::mcp::handler::AppState;
use crate::mcp::tools::util::render_outcome;
use crate::tabular::to_csv;
use crate::{AppError, Result};

/// URI of the channel directory resource.
pub const CHANNELS_URI: &str = "slack://workspace/channels";

/// URI of the user directory resource.
pub const USERS_URI: &str = "slack://workspace/users";

const CSV_MIME: &str = "text/csv";

fn resource(uri: &str, name: &str, description: &str) -> Annotated<RawResource> {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.into());
    raw.mime_type = Some(CSV_MIME.into());
    Annotated::new(raw, None)
}

/// Build the `ListResourcesResult` for both directory resources.
#[must_use]
pub fn list_resources() -> ListResourcesResult {
    ListResourcesResult::with_all_items(vec![
        resource(
            CHANNELS_URI,
            "Slack Channel Directory",
            "Every cached conversation: id, name, topic, purpose, memberCount.",
        ),
        resource(
            USERS_URI,
            "Slack User Directory",
            "Every cached workspace member: userID, userName, realName.",
        ),
    ])
}

fn check_uri(uri: &str) -> Result<()> {
    if uri == CHANNELS_URI || uri == USERS_URI {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("unknown resource '{uri}'")))
    }
}

/// Render the CSV body for a directory resource URI.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` for an unknown URI, or the error that
/// stopped the directory from loading.
pub async fn render(uri: &str, state: &AppState) -> Result<String> {
    check_uri(uri)?;

    let directory = state.directory().await?;
    info!(uri, team = directory.team().unwrap_or_default(), "reading directory resource");

    if uri == CHANNELS_URI {
        let channels: Vec<_> = directory.channels().cloned().collect();
        to_csv(&channels)
    } else {
        let users: Vec<_> = directory.users().cloned().collect();
        to_csv(&users)
    }
}

/// Handle `resources/read` for the directory resources.
///
/// Failures to load the directory become an `Error: <detail>` body, the
/// same way tool calls report them.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` for an unknown URI.
pub async fn read_resource(uri: &str, state: &AppState) -> Result<ReadResourceResult> {
    check_uri(uri)?;
    let body = render_outcome(uri, render(uri, state).await);
    let mut contents = ResourceContents::text(body, uri);
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(CSV_MIME.into());
    }
    Ok(ReadResourceResult {
        contents: vec![contents],
    })
}
