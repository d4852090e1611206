#![forbid(unsafe_code)]

//! MCP server exposing a Slack workspace to AI agents.
//!
//! Tools read channel history, threads, and search results and can post
//! messages when enabled; resources expose the cached channel and user
//! directories. Results are rendered as CSV tables.

pub mod config;
pub mod config_watcher;
pub mod directory;
pub mod errors;
pub mod limit;
pub mod mcp;
pub mod models;
pub mod slack;
pub mod tabular;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
