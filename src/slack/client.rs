//! HTTP implementation of [`SlackApi`] over the Slack Web API.

use std::time::Duration;

use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    ApiChannel, ApiMessage, ApiUser, AuthIdentity, HistoryRequest, MessagePage,
    PostMessageRequest, PostedMessage, RepliesRequest, SearchPage, SearchRequest,
};
use super::{SlackApi, SlackFuture};
use crate::config::SlackAuth;
use crate::models::channel::ChannelKind;
use crate::{AppError, Result};

const USERS_PAGE_SIZE: u32 = 200;
const CONVERSATIONS_PAGE_SIZE: u32 = 1000;
/// Upper bound on pages fetched by a single list call.
const MAX_LIST_PAGES: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack Web API client authenticated with a user or browser token.
pub struct SlackWebClient {
    http: reqwest::Client,
    base_url: String,
    auth: SlackAuth,
}

impl SlackWebClient {
    /// Create a client for `base_url` (normally `https://slack.com/api`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, auth: SlackAuth) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder =
            builder.header(USER_AGENT, concat!("slack-mcp-server/", env!("CARGO_PKG_VERSION")));
        match &self.auth {
            SlackAuth::UserToken(token) => builder.bearer_auth(token),
            SlackAuth::Browser { token, cookie } => builder
                .bearer_auth(token)
                .header(COOKIE, format!("d={cookie}")),
        }
    }

    async fn get(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = Url::parse_with_params(&format!("{}/{method}", self.base_url), params)
            .map_err(|err| AppError::Config(format!("invalid slack url for {method}: {err}")))?;
        debug!(method, "slack api get");
        let response = self.authorize(self.http.get(url)).send().await?;
        read_envelope(method, response).await
    }

    async fn post_json<B: Serialize + Sync>(&self, method: &str, body: &B) -> Result<Value> {
        let url = format!("{}/{method}", self.base_url);
        debug!(method, "slack api post");
        let response = self.authorize(self.http.post(url)).json(body).send().await?;
        read_envelope(method, response).await
    }

    /// Follow `response_metadata.next_cursor` until exhausted, collecting `key`.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        method: &str,
        key: &str,
        base_params: Vec<(&str, String)>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_LIST_PAGES {
            let mut params = base_params.clone();
            if !cursor.is_empty() {
                params.push(("cursor", cursor.clone()));
            }
            let body = self.get(method, &params).await?;
            items.extend(field::<Vec<T>>(&body, key)?);

            cursor = next_cursor(&body);
            if cursor.is_empty() {
                return Ok(items);
            }
        }

        warn!(method, pages = MAX_LIST_PAGES, "page limit reached; result truncated");
        Ok(items)
    }
}

/// Check HTTP status and the `ok`/`error` envelope.
async fn read_envelope(method: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::Slack("ratelimited".into()));
    }
    if !status.is_success() {
        return Err(AppError::Slack(format!("{method} returned HTTP {status}")));
    }

    let body: Value = response.json().await?;
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(body)
    } else {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        Err(AppError::Slack(code.to_owned()))
    }
}

/// Decode `body[key]`, treating a missing or null key as the default value.
fn field<T: DeserializeOwned + Default>(body: &Value, key: &str) -> Result<T> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(T::deserialize(value)?),
    }
}

fn next_cursor(body: &Value) -> String {
    body.pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn window_params(
    params: &mut Vec<(&'static str, String)>,
    cursor: Option<String>,
    oldest: Option<String>,
    latest: Option<String>,
) {
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        params.push(("cursor", cursor));
    }
    if let Some(oldest) = oldest {
        params.push(("oldest", oldest));
    }
    if let Some(latest) = latest {
        params.push(("latest", latest));
    }
}

fn message_page(body: &Value) -> Result<MessagePage> {
    Ok(MessagePage {
        messages: field::<Vec<ApiMessage>>(body, "messages")?,
        next_cursor: next_cursor(body),
    })
}

fn search_page(body: &Value) -> Result<SearchPage> {
    let messages = body.get("messages").cloned().unwrap_or(Value::Null);
    let number = |pointers: &[&str]| {
        pointers
            .iter()
            .find_map(|p| messages.pointer(p).and_then(Value::as_u64))
            .and_then(|n| u32::try_from(n).ok())
    };

    Ok(SearchPage {
        matches: field::<Vec<ApiMessage>>(&messages, "matches")?,
        page: number(&["/pagination/page", "/paging/page"]).unwrap_or(1),
        page_count: number(&["/pagination/page_count", "/paging/pages"]).unwrap_or(1),
    })
}

impl SlackApi for SlackWebClient {
    fn auth_test(&self) -> SlackFuture<'_, AuthIdentity> {
        Box::pin(async move {
            let body = self.get("auth.test", &[]).await?;
            Ok(AuthIdentity::deserialize(&body)?)
        })
    }

    fn list_users(&self) -> SlackFuture<'_, Vec<ApiUser>> {
        Box::pin(async move {
            self.collect_pages(
                "users.list",
                "members",
                vec![("limit", USERS_PAGE_SIZE.to_string())],
            )
            .await
        })
    }

    fn list_conversations(&self, kind: ChannelKind) -> SlackFuture<'_, Vec<ApiChannel>> {
        Box::pin(async move {
            self.collect_pages(
                "conversations.list",
                "channels",
                vec![
                    ("types", kind.as_str().to_owned()),
                    ("limit", CONVERSATIONS_PAGE_SIZE.to_string()),
                ],
            )
            .await
        })
    }

    fn conversations_history(&self, request: HistoryRequest) -> SlackFuture<'_, MessagePage> {
        Box::pin(async move {
            let mut params = vec![
                ("channel", request.channel),
                ("limit", request.limit.to_string()),
            ];
            window_params(&mut params, request.cursor, request.oldest, request.latest);
            if request.inclusive {
                params.push(("inclusive", "true".to_owned()));
            }
            let body = self.get("conversations.history", &params).await?;
            message_page(&body)
        })
    }

    fn conversations_replies(&self, request: RepliesRequest) -> SlackFuture<'_, MessagePage> {
        Box::pin(async move {
            let mut params = vec![
                ("channel", request.channel),
                ("ts", request.ts),
                ("limit", request.limit.to_string()),
            ];
            window_params(&mut params, request.cursor, request.oldest, request.latest);
            if request.inclusive {
                params.push(("inclusive", "true".to_owned()));
            }
            let body = self.get("conversations.replies", &params).await?;
            message_page(&body)
        })
    }

    fn search_messages(&self, request: SearchRequest) -> SlackFuture<'_, SearchPage> {
        Box::pin(async move {
            let params = vec![
                ("query", request.query),
                ("count", request.count.to_string()),
                ("page", request.page.to_string()),
            ];
            let body = self.get("search.messages", &params).await?;
            search_page(&body)
        })
    }

    fn post_message(&self, request: PostMessageRequest) -> SlackFuture<'_, PostedMessage> {
        Box::pin(async move {
            let body = self.post_json("chat.postMessage", &request).await?;
            Ok(PostedMessage::deserialize(&body)?)
        })
    }

    fn mark_conversation(&self, channel: String, ts: String) -> SlackFuture<'_, ()> {
        Box::pin(async move {
            let payload = serde_json::json!({ "channel": channel, "ts": ts });
            self.post_json("conversations.mark", &payload).await?;
            Ok(())
        })
    }
}
