//! MCP server handler, shared application state, and tool router.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use rmcp::handler::server::{
    tool::{ToolCallContext, ToolRoute, ToolRouter},
    ServerHandler,
};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::{info, info_span, warn, Instrument};

use crate::config::{
    GlobalConfig, SlackCredentials, XOXC_TOKEN_ENV, XOXD_TOKEN_ENV, XOXP_TOKEN_ENV,
};
use crate::directory::{Directory, DirectoryCache};
use crate::mcp::resources;
use crate::mcp::tools;
use crate::slack::client::SlackWebClient;
use crate::slack::SlackApi;
use crate::{AppError, Result};

/// Shared application state accessible by all MCP tool handlers.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Cached users and conversations.
    pub directory: DirectoryCache,
    /// Slack API client; absent until credentials are supplied.
    slack: RwLock<Option<Arc<dyn SlackApi>>>,
}

impl AppState {
    /// Create state around an existing client (or none).
    #[must_use]
    pub fn new(config: Arc<GlobalConfig>, slack: Option<Arc<dyn SlackApi>>) -> Self {
        Self {
            config,
            directory: DirectoryCache::new(),
            slack: RwLock::new(slack),
        }
    }

    /// Create state, building a web client when `credentials` are usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn from_credentials(
        config: Arc<GlobalConfig>,
        credentials: &SlackCredentials,
    ) -> Result<Self> {
        let client = build_client(&config, credentials)?;
        if client.is_none() {
            warn!("no slack credentials found; tools will report missing configuration");
        }
        Ok(Self::new(config, client))
    }

    /// Whether a Slack client is currently configured.
    #[must_use]
    pub fn has_client(&self) -> bool {
        self.slack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The current Slack client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when no credentials are configured.
    pub fn slack(&self) -> Result<Arc<dyn SlackApi>> {
        self.slack
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                AppError::Config(format!(
                    "No Slack token configured. Set {XOXP_TOKEN_ENV} or both \
                     {XOXC_TOKEN_ENV} and {XOXD_TOKEN_ENV}"
                ))
            })
    }

    /// The directory snapshot, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` without credentials, or the Slack error
    /// that stopped the load.
    pub async fn directory(&self) -> Result<Arc<Directory>> {
        if let Some(snapshot) = self.directory.snapshot() {
            return Ok(snapshot);
        }
        let slack = self.slack()?;
        self.directory.get_or_load(slack.as_ref()).await
    }

    /// Swap the Slack client and drop the cached directory.
    pub fn replace_client(&self, slack: Option<Arc<dyn SlackApi>>) {
        *self.slack.write().unwrap_or_else(PoisonError::into_inner) = slack;
        self.directory.clear();
    }

    /// Rebuild the Slack client from fresh credentials.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built; the
    /// previous client stays in place.
    pub fn rotate_credentials(&self, credentials: &SlackCredentials) -> Result<()> {
        let client = build_client(&self.config, credentials)?;
        let configured = client.is_some();
        self.replace_client(client);
        info!(configured, "slack credentials rotated; directory cache cleared");
        Ok(())
    }
}

/// Build a web client for `credentials`, or `None` when they are incomplete.
///
/// # Errors
///
/// Returns `AppError::Config` if the HTTP client cannot be built.
pub fn build_client(
    config: &GlobalConfig,
    credentials: &SlackCredentials,
) -> Result<Option<Arc<dyn SlackApi>>> {
    let Some(auth) = credentials.auth() else {
        return Ok(None);
    };
    let client = SlackWebClient::new(config.api_base_url.clone(), auth)?;
    Ok(Some(Arc::new(client)))
}

/// MCP server exposing Slack tools and directory resources.
#[derive(Clone)]
pub struct SlackMcpServer {
    state: Arc<AppState>,
}

impl SlackMcpServer {
    /// Create a new MCP server bound to shared application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn tool_router() -> ToolRouter<Self> {
        let mut router = ToolRouter::new();

        for tool in Self::all_tools() {
            let name = tool.name.to_string();
            match name.as_str() {
                tools::conversations_history::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::conversations_history::handle(context))
                    }));
                }
                tools::conversations_replies::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::conversations_replies::handle(context))
                    }));
                }
                tools::conversations_add_message::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::conversations_add_message::handle(context))
                    }));
                }
                tools::conversations_search_messages::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::conversations_search_messages::handle(context))
                    }));
                }
                tools::channels_list::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::channels_list::handle(context))
                    }));
                }
                _ => {
                    router.add_route(ToolRoute::new_dyn(tool, |_context| {
                        Box::pin(async {
                            Err(rmcp::ErrorData::internal_error("tool not implemented", None))
                        })
                    }));
                }
            }
        }

        router
    }

    /// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
    fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
        match value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::default()),
        }
    }

    /// Every tool advertised by `tools/list`.
    #[must_use]
    #[allow(clippy::too_many_lines)] // Tool definitions are verbose.
    pub fn all_tools() -> Vec<Tool> {
        vec![
            Tool::new(
                tools::conversations_history::NAME,
                "Get messages from a channel or DM by channel_id. Returns a CSV table; \
                 pass the cursor column back to fetch the next page.",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "channel_id": {
                            "type": "string",
                            "description": "ID of the channel (Cxxxxxxxxxx) or its name: #general, @username_dm"
                        },
                        "include_activity_messages": {
                            "type": "boolean",
                            "default": false,
                            "description": "Include channel join/leave messages"
                        },
                        "cursor": {
                            "type": "string",
                            "default": "",
                            "description": "Cursor from a previous page"
                        },
                        "limit": {
                            "type": "string",
                            "default": "1d",
                            "description": "Time window (1d, 1w, 30d, 90d) or message count (50)"
                        }
                    },
                    "required": ["channel_id"]
                })),
            ),
            Tool::new(
                tools::conversations_replies::NAME,
                "Get a thread of messages posted in reply to a parent message.",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "channel_id": {
                            "type": "string",
                            "description": "ID of the channel (Cxxxxxxxxxx) or its name: #general, @username_dm"
                        },
                        "thread_ts": {
                            "type": "string",
                            "description": "Timestamp of the parent message, e.g. 1234567890.123456"
                        },
                        "include_activity_messages": { "type": "boolean", "default": false },
                        "cursor": { "type": "string", "default": "" },
                        "limit": {
                            "type": "string",
                            "default": "1d",
                            "description": "Time window (1d, 1w, 30d, 90d) or message count (50)"
                        }
                    },
                    "required": ["channel_id", "thread_ts"]
                })),
            ),
            Tool::new(
                tools::conversations_add_message::NAME,
                "Post a message to a channel, private channel, or DM. Disabled unless \
                 SLACK_MCP_ADD_MESSAGE_TOOL is set.",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "channel_id": {
                            "type": "string",
                            "description": "ID of the channel (Cxxxxxxxxxx) or its name: #general, @username_dm"
                        },
                        "payload": { "type": "string", "description": "Message text" },
                        "thread_ts": {
                            "type": "string",
                            "default": "",
                            "description": "Parent message timestamp to reply in a thread"
                        },
                        "content_type": {
                            "type": "string",
                            "enum": ["text/markdown", "text/plain"],
                            "default": "text/markdown"
                        }
                    },
                    "required": ["channel_id", "payload"]
                })),
            ),
            Tool::new(
                tools::conversations_search_messages::NAME,
                "Search messages across channels, DMs, and threads. search_query may also \
                 be a Slack message link, which returns that single message.",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "search_query": { "type": "string", "default": "" },
                        "filter_in_channel": {
                            "type": "string",
                            "default": "",
                            "description": "Channel ID or #name"
                        },
                        "filter_in_im_or_mpim": {
                            "type": "string",
                            "default": "",
                            "description": "DM or group DM ID or @name"
                        },
                        "filter_users_with": { "type": "string", "default": "" },
                        "filter_users_from": { "type": "string", "default": "" },
                        "filter_date_before": { "type": "string", "default": "" },
                        "filter_date_after": { "type": "string", "default": "" },
                        "filter_date_on": { "type": "string", "default": "" },
                        "filter_date_during": { "type": "string", "default": "" },
                        "filter_threads_only": { "type": "boolean", "default": false },
                        "cursor": {
                            "type": "string",
                            "default": "",
                            "description": "Page number from a previous result"
                        },
                        "limit": { "type": "integer", "default": 20, "minimum": 1, "maximum": 100 }
                    }
                })),
            ),
            Tool::new(
                tools::channels_list::NAME,
                "List channels from the cached workspace directory.",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "channel_types": {
                            "type": "string",
                            "description": "Comma-separated types: mpim, im, public_channel, private_channel"
                        },
                        "sort": {
                            "type": "string",
                            "default": "",
                            "description": "Set to popularity to sort by member count"
                        },
                        "limit": { "type": "integer", "default": 100, "minimum": 1, "maximum": 1000 },
                        "cursor": { "type": "string", "default": "" }
                    },
                    "required": ["channel_types"]
                })),
            ),
        ]
    }
}

impl ServerHandler for SlackMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Read Slack channels, threads, and search results as CSV tables. \
                 Channel and user directories are available as resources."
                    .into(),
            ),
            ..Default::default()
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        let router = Self::tool_router();
        let span = info_span!("call_tool", tool = %request.name);

        async move {
            router
                .call(ToolCallContext::new(self, request, context))
                .await
        }
        .instrument(span)
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult::with_all_items(Self::all_tools())))
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListResourcesResult, rmcp::ErrorData>> + Send + '_
    {
        std::future::ready(Ok(resources::directory::list_resources()))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ReadResourceResult, rmcp::ErrorData>> + Send + '_
    {
        async move {
            resources::directory::read_resource(&request.uri, &self.state)
                .await
                .map_err(|err| match err {
                    AppError::InvalidInput(msg) => {
                        rmcp::ErrorData::resource_not_found(msg, None)
                    }
                    other => rmcp::ErrorData::internal_error(other.to_string(), None),
                })
        }
    }
}
