//! Integration tests for the directory resources.

use std::sync::Arc;

use slack_mcp_server::config::GlobalConfig;
use slack_mcp_server::mcp::handler::AppState;
use slack_mcp_server::mcp::resources::directory::{
    read_resource, render, CHANNELS_URI, USERS_URI,
};
use slack_mcp_server::AppError;

use super::test_helpers::{test_state, FakeSlack};

#[tokio::test]
async fn channels_resource_dumps_cache() {
    let state = test_state(Arc::new(FakeSlack::workspace()));

    let body = render(CHANNELS_URI, &state).await.expect("render");

    assert_eq!(body, "id,name,topic,purpose,memberCount\nC1,general,,,5\n");
}

#[tokio::test]
async fn users_resource_dumps_cache() {
    let state = test_state(Arc::new(FakeSlack::workspace()));

    let result = read_resource(USERS_URI, &state).await.expect("read");

    assert_eq!(result.contents.len(), 1);
    let json = serde_json::to_value(&result.contents[0]).expect("serialize");
    assert_eq!(json["uri"], USERS_URI);
    assert_eq!(json["mimeType"], "text/csv");
    assert_eq!(json["text"], "userID,userName,realName\nU1,alice,Alice A\n");
}

#[tokio::test]
async fn unknown_uri_is_invalid_input() {
    let state = test_state(Arc::new(FakeSlack::workspace()));

    let err = render("slack://workspace/emoji", &state).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn read_of_unknown_uri_is_an_error() {
    let state = test_state(Arc::new(FakeSlack::workspace()));

    let err = read_resource("slack://workspace/emoji", &state).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
}

fn body(result: &rmcp::model::ReadResourceResult) -> String {
    let json = serde_json::to_value(&result.contents[0]).expect("serialize");
    json["text"].as_str().unwrap_or_default().to_owned()
}

#[tokio::test]
async fn missing_credentials_render_as_error_text() {
    let state = AppState::new(Arc::new(GlobalConfig::default()), None);

    let result = read_resource(USERS_URI, &state)
        .await
        .expect("failures stay inside the resource body");

    assert!(
        body(&result).starts_with("Error: No Slack token configured."),
        "{}",
        body(&result)
    );
}

#[tokio::test]
async fn failed_directory_load_renders_as_error_text() {
    let fake = Arc::new(FakeSlack {
        fail_method: Some("auth.test"),
        fail_code: "invalid_auth".into(),
        ..FakeSlack::workspace()
    });
    let state = test_state(fake);

    let result = read_resource(CHANNELS_URI, &state)
        .await
        .expect("failures stay inside the resource body");

    assert_eq!(body(&result), "Error: invalid_auth");
}
