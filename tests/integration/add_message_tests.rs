//! Integration tests for the `conversations_add_message` tool.

use std::sync::Arc;

use serde_json::json;

use slack_mcp_server::config::GlobalConfig;
use slack_mcp_server::mcp::tools::conversations_add_message;
use slack_mcp_server::slack::types::PostMessageRequest;

use super::test_helpers::{args, posting_config, state_with, test_state, Call, FakeSlack};

#[tokio::test]
async fn disabled_posting_refuses_without_upstream_call() {
    let fake = Arc::new(FakeSlack::workspace());
    let state = test_state(Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi" })),
    )
    .await;

    assert_eq!(
        out,
        "Error: Message posting is disabled. Set SLACK_MCP_ADD_MESSAGE_TOOL to enable."
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn markdown_post_returns_timestamp() {
    let fake = Arc::new(FakeSlack::workspace());
    let state = state_with(posting_config(), Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "#general", "payload": "*hello*", "thread_ts": "1716932719.000123" })),
    )
    .await;

    assert_eq!(out, "Message posted successfully. Timestamp: 1716932800.000100");
    assert_eq!(
        fake.data_calls(),
        vec![Call::Post(PostMessageRequest {
            channel: "C1".into(),
            text: "*hello*".into(),
            thread_ts: Some("1716932719.000123".into()),
            mrkdwn: true,
            unfurl_links: false,
            unfurl_media: false,
        })]
    );
}

#[tokio::test]
async fn plain_text_disables_mrkdwn() {
    let fake = Arc::new(FakeSlack::workspace());
    let state = state_with(posting_config(), Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "a_b", "content_type": "text/plain" })),
    )
    .await;

    assert!(out.starts_with("Message posted successfully."));
    match fake.data_calls().as_slice() {
        [Call::Post(request)] => {
            assert!(!request.mrkdwn);
            assert!(request.thread_ts.is_none());
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_content_type_is_rejected() {
    let fake = Arc::new(FakeSlack::workspace());
    let state = state_with(posting_config(), Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi", "content_type": "text/html" })),
    )
    .await;

    assert!(out.starts_with("Error: unsupported content_type 'text/html'"), "{out}");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn empty_payload_is_rejected() {
    let fake = Arc::new(FakeSlack::workspace());
    let state = state_with(posting_config(), Arc::clone(&fake));

    let out =
        conversations_add_message::execute(&state, args(json!({ "channel_id": "C1", "payload": " " })))
            .await;

    assert_eq!(out, "Error: payload must not be empty");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn allowlist_blocks_other_channels() {
    let fake = Arc::new(FakeSlack::workspace());
    let mut config = posting_config();
    config.posting.allowed_channels = vec!["C2".into()];
    let state = state_with(config, Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi" })),
    )
    .await;

    assert!(out.starts_with("Error: posting to channel C1 is not allowed"), "{out}");
    assert!(fake.data_calls().is_empty());
}

#[tokio::test]
async fn mark_as_read_and_unfurl_follow_config() {
    let fake = Arc::new(FakeSlack::workspace());
    let mut config = posting_config();
    config.posting.mark_as_read = true;
    config.posting.unfurl_links = true;
    let state = state_with(config, Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "see https://example.com" })),
    )
    .await;

    assert!(out.starts_with("Message posted successfully."));
    let calls = fake.data_calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        Call::Post(request) => assert!(request.unfurl_links && request.unfurl_media),
        other => panic!("expected post, got {other:?}"),
    }
    assert_eq!(
        calls[1],
        Call::Mark {
            channel: "C1".into(),
            ts: "1716932800.000100".into(),
        }
    );
}

#[tokio::test]
async fn mark_failure_does_not_fail_the_post() {
    let fake = Arc::new(FakeSlack {
        fail_method: Some("conversations.mark"),
        fail_code: "not_allowed".into(),
        ..FakeSlack::workspace()
    });
    let mut config = posting_config();
    config.posting.mark_as_read = true;
    let state = state_with(config, Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi" })),
    )
    .await;

    assert_eq!(out, "Message posted successfully. Timestamp: 1716932800.000100");
}

#[tokio::test]
async fn post_error_surfaces_slack_code() {
    let fake = Arc::new(FakeSlack {
        fail_method: Some("chat.postMessage"),
        fail_code: "not_in_channel".into(),
        ..FakeSlack::workspace()
    });
    let state = state_with(posting_config(), Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi" })),
    )
    .await;

    assert_eq!(out, "Error: not_in_channel");
}

#[tokio::test]
async fn env_override_enables_posting() {
    let fake = Arc::new(FakeSlack::workspace());
    let mut config = GlobalConfig::default();
    config.apply_overrides_from(|key| (key == "SLACK_MCP_ADD_MESSAGE_TOOL").then(|| "C1".to_owned()));
    let state = state_with(config, Arc::clone(&fake));

    let out = conversations_add_message::execute(
        &state,
        args(json!({ "channel_id": "C1", "payload": "hi" })),
    )
    .await;

    assert!(out.starts_with("Message posted successfully."), "{out}");
}
