//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Keychain service name under which Slack tokens may be stored.
pub const KEYRING_SERVICE: &str = "slack-mcp-server";

/// User OAuth token (`xoxp-…`), preferred when present.
pub const XOXP_TOKEN_ENV: &str = "SLACK_MCP_XOXP_TOKEN";
/// Browser session token (`xoxc-…`), used together with [`XOXD_TOKEN_ENV`].
pub const XOXC_TOKEN_ENV: &str = "SLACK_MCP_XOXC_TOKEN";
/// Browser `d` cookie (`xoxd-…`) paired with the session token.
pub const XOXD_TOKEN_ENV: &str = "SLACK_MCP_XOXD_TOKEN";

/// Enables `conversations_add_message`; `true` or a channel ID list.
pub const ADD_MESSAGE_TOOL_ENV: &str = "SLACK_MCP_ADD_MESSAGE_TOOL";
/// Marks the conversation read after a successful post.
pub const ADD_MESSAGE_MARK_ENV: &str = "SLACK_MCP_ADD_MESSAGE_MARK";
/// Lets Slack unfurl links and media in posted messages.
pub const ADD_MESSAGE_UNFURLING_ENV: &str = "SLACK_MCP_ADD_MESSAGE_UNFURLING";

/// Message-posting settings for the `conversations_add_message` tool.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PostingConfig {
    /// Whether posting is allowed at all.
    #[serde(default)]
    pub enabled: bool,
    /// Channel IDs posting is restricted to; empty means every channel.
    #[serde(default)]
    pub allowed_channels: Vec<String>,
    /// Mark the conversation read at the posted message.
    #[serde(default)]
    pub mark_as_read: bool,
    /// Let Slack unfurl links and media.
    #[serde(default)]
    pub unfurl_links: bool,
}

impl PostingConfig {
    /// Whether a post to `channel_id` passes the allowlist.
    #[must_use]
    pub fn allows(&self, channel_id: &str) -> bool {
        self.allowed_channels.is_empty() || self.allowed_channels.iter().any(|c| c == channel_id)
    }
}

fn default_http_host() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_api_base_url() -> String {
    "https://slack.com/api".into()
}

/// Global configuration parsed from an optional `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the Streamable HTTP transport binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// Port for the Streamable HTTP transport.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Base URL of the Slack Web API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Message-posting gate and options.
    #[serde(default)]
    pub posting: PostingConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            api_base_url: default_api_base_url(),
            posting: PostingConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SLACK_MCP_ADD_MESSAGE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply `SLACK_MCP_ADD_MESSAGE_*` overrides from an arbitrary lookup.
    ///
    /// Empty values leave the TOML setting untouched.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(value) = non_empty(ADD_MESSAGE_TOOL_ENV) {
            match parse_flag(&value) {
                Some(enabled) => {
                    self.posting.enabled = enabled;
                    self.posting.allowed_channels.clear();
                }
                None => {
                    let channels: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_owned)
                        .collect();
                    debug!(count = channels.len(), "posting restricted to channel allowlist");
                    self.posting.enabled = !channels.is_empty();
                    self.posting.allowed_channels = channels;
                }
            }
        }

        if let Some(value) = non_empty(ADD_MESSAGE_MARK_ENV) {
            self.posting.mark_as_read = parse_flag(&value).unwrap_or(true);
        }

        if let Some(value) = non_empty(ADD_MESSAGE_UNFURLING_ENV) {
            self.posting.unfurl_links = parse_flag(&value).unwrap_or(true);
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }

        if self.http_host.trim().is_empty() {
            return Err(AppError::Config("http_host must not be empty".into()));
        }

        Ok(())
    }
}

/// Interpret a boolean-ish environment value; `None` for anything else.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// How the Slack Web client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum SlackAuth {
    /// `xoxp` user token sent as a bearer token.
    UserToken(String),
    /// `xoxc` browser token sent as bearer, with the `xoxd` value as the `d` cookie.
    Browser {
        /// The `xoxc-…` token.
        token: String,
        /// The `xoxd-…` cookie value.
        cookie: String,
    },
}

impl fmt::Debug for SlackAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserToken(_) => f.write_str("UserToken(<redacted>)"),
            Self::Browser { .. } => f.write_str("Browser { <redacted> }"),
        }
    }
}

/// Raw Slack tokens supplied out of band.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SlackCredentials {
    /// `SLACK_MCP_XOXP_TOKEN`.
    pub user_token: Option<String>,
    /// `SLACK_MCP_XOXC_TOKEN`.
    pub browser_token: Option<String>,
    /// `SLACK_MCP_XOXD_TOKEN`.
    pub browser_cookie: Option<String>,
}

impl fmt::Debug for SlackCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackCredentials")
            .field("user_token", &self.user_token.is_some())
            .field("browser_token", &self.browser_token.is_some())
            .field("browser_cookie", &self.browser_cookie.is_some())
            .finish()
    }
}

impl SlackCredentials {
    /// Build credentials from a key lookup; blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        Self {
            user_token: get(XOXP_TOKEN_ENV),
            browser_token: get(XOXC_TOKEN_ENV),
            browser_cookie: get(XOXD_TOKEN_ENV),
        }
    }

    /// Read credentials from the process environment only.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse credentials out of a dotenv file without touching the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or parsed.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path).map_err(|err| {
            AppError::Config(format!("failed to read env file '{}': {err}", path.display()))
        })?;

        let mut pairs = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|err| {
                AppError::Config(format!("invalid env file '{}': {err}", path.display()))
            })?;
            pairs.push((key, value));
        }

        Ok(Self::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }))
    }

    /// Load credentials from OS keychain with env-var fallback.
    ///
    /// Each token is looked up independently; a missing token is not an
    /// error here because the server can start without Slack access.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain lookup task panics.
    pub async fn load() -> Result<Self> {
        Ok(Self {
            user_token: load_credential("xoxp_token", XOXP_TOKEN_ENV).await?,
            browser_token: load_credential("xoxc_token", XOXC_TOKEN_ENV).await?,
            browser_cookie: load_credential("xoxd_token", XOXD_TOKEN_ENV).await?,
        })
    }

    /// Pick the authentication scheme: `xoxp` first, then `xoxc` + `xoxd`.
    #[must_use]
    pub fn auth(&self) -> Option<SlackAuth> {
        if let Some(token) = &self.user_token {
            return Some(SlackAuth::UserToken(token.clone()));
        }
        match (&self.browser_token, &self.browser_cookie) {
            (Some(token), Some(cookie)) => Some(SlackAuth::Browser {
                token: token.clone(),
                cookie: cookie.clone(),
            }),
            _ => None,
        }
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.trim().is_empty() => return Ok(Some(value.trim().to_owned())),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {
            debug!(key = keyring_key, "no keychain entry, trying env var");
        }
        Err(err) => {
            warn!(key = keyring_key, ?err, "keychain lookup failed, trying env var");
        }
    }

    Ok(env::var(env_key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty()))
}
