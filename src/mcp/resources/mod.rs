//! MCP resource handlers.

pub mod directory;
