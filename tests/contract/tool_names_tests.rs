//! Contract tests pinning the advertised MCP tool names.

use slack_mcp_server::mcp::handler::SlackMcpServer;
use slack_mcp_server::mcp::tools::{
    channels_list, conversations_add_message, conversations_history, conversations_replies,
    conversations_search_messages,
};

#[test]
fn exactly_five_tools_are_advertised() {
    let names: Vec<String> = SlackMcpServer::all_tools()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();

    assert_eq!(
        names,
        vec![
            "conversations_history",
            "conversations_replies",
            "conversations_add_message",
            "conversations_search_messages",
            "channels_list",
        ]
    );
}

#[test]
fn handler_constants_match_advertised_names() {
    let names: Vec<String> = SlackMcpServer::all_tools()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();

    for constant in [
        conversations_history::NAME,
        conversations_replies::NAME,
        conversations_add_message::NAME,
        conversations_search_messages::NAME,
        channels_list::NAME,
    ] {
        assert!(names.iter().any(|n| n == constant), "{constant} not advertised");
    }
}

#[test]
fn every_tool_has_a_description() {
    for tool in SlackMcpServer::all_tools() {
        let description = tool.description.as_deref().unwrap_or_default();
        assert!(!description.is_empty(), "{} lacks a description", tool.name);
    }
}
