//! Contract tests for tool input schemas: required fields and defaults.

use serde_json::{json, Value};

use slack_mcp_server::mcp::handler::SlackMcpServer;

fn schema(name: &str) -> Value {
    let tool = SlackMcpServer::all_tools()
        .into_iter()
        .find(|tool| tool.name == name)
        .unwrap_or_else(|| panic!("tool {name} missing"));
    Value::Object(tool.input_schema.as_ref().clone())
}

fn required(name: &str) -> Vec<String> {
    schema(name)["required"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn history_requires_channel_only() {
    assert_eq!(required("conversations_history"), vec!["channel_id"]);
    let schema = schema("conversations_history");
    assert_eq!(schema["properties"]["limit"]["default"], json!("1d"));
    assert_eq!(schema["properties"]["include_activity_messages"]["default"], json!(false));
}

#[test]
fn replies_requires_thread() {
    assert_eq!(required("conversations_replies"), vec!["channel_id", "thread_ts"]);
}

#[test]
fn add_message_requires_payload() {
    assert_eq!(required("conversations_add_message"), vec!["channel_id", "payload"]);
    let schema = schema("conversations_add_message");
    assert_eq!(
        schema["properties"]["content_type"]["enum"],
        json!(["text/markdown", "text/plain"])
    );
    assert_eq!(schema["properties"]["content_type"]["default"], json!("text/markdown"));
}

#[test]
fn search_has_no_required_fields() {
    assert!(required("conversations_search_messages").is_empty());
    let schema = schema("conversations_search_messages");
    assert_eq!(schema["properties"]["limit"]["default"], json!(20));
    assert_eq!(schema["properties"]["limit"]["maximum"], json!(100));
    assert_eq!(schema["properties"]["filter_threads_only"]["type"], json!("boolean"));
}

#[test]
fn channels_list_requires_types() {
    assert_eq!(required("channels_list"), vec!["channel_types"]);
    let schema = schema("channels_list");
    assert_eq!(schema["properties"]["limit"]["default"], json!(100));
    assert_eq!(schema["properties"]["limit"]["maximum"], json!(1000));
}

#[test]
fn every_schema_is_an_object() {
    for tool in SlackMcpServer::all_tools() {
        assert_eq!(tool.input_schema.get("type"), Some(&json!("object")), "{}", tool.name);
    }
}
