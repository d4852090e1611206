//! Integration tests for credential rotation and directory reloads.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use slack_mcp_server::config::{GlobalConfig, SlackCredentials};
use slack_mcp_server::config_watcher::{apply_rotations, CredentialWatcher};
use slack_mcp_server::directory::DirectoryState;
use slack_mcp_server::mcp::handler::AppState;
use slack_mcp_server::mcp::tools::channels_list;
use slack_mcp_server::slack::SlackApi;

use super::test_helpers::{args, test_state, Call, FakeSlack};

fn user_token(token: &str) -> SlackCredentials {
    SlackCredentials {
        user_token: Some(token.into()),
        ..SlackCredentials::default()
    }
}

#[tokio::test]
async fn replacing_client_clears_directory() {
    let first = Arc::new(FakeSlack::workspace());
    let state = test_state(Arc::clone(&first));

    state.directory().await.expect("initial load");
    assert!(matches!(state.directory.state(), DirectoryState::Loaded(_)));

    let second = Arc::new(FakeSlack::workspace());
    let client: Arc<dyn SlackApi> = second.clone();
    state.replace_client(Some(client));
    assert!(matches!(state.directory.state(), DirectoryState::Empty));

    let _ = channels_list::execute(&state, args(json!({ "channel_types": "public_channel" }))).await;
    assert!(second.calls().contains(&Call::AuthTest), "reload goes to new client");
    assert_eq!(
        first.calls().iter().filter(|c| **c == Call::AuthTest).count(),
        1
    );
}

#[tokio::test]
async fn rotation_installs_web_client() {
    let state = AppState::new(Arc::new(GlobalConfig::default()), None);
    assert!(!state.has_client());

    state
        .rotate_credentials(&user_token("xoxp-rotated"))
        .expect("rotate");

    assert!(state.has_client());
}

#[tokio::test]
async fn rotation_loop_applies_and_stops_on_cancel() {
    let state = Arc::new(AppState::new(Arc::new(GlobalConfig::default()), None));
    let (tx, rx) = mpsc::unbounded_channel();
    let ct = CancellationToken::new();
    let handle = tokio::spawn(apply_rotations(Arc::clone(&state), rx, ct.clone()));

    tx.send(user_token("xoxp-1")).expect("send");
    for _ in 0..50 {
        if state.has_client() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(state.has_client());

    ct.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("loop stops")
        .expect("join");
}

#[tokio::test]
async fn failed_auth_leaves_cache_empty() {
    let fake = Arc::new(FakeSlack {
        fail_method: Some("auth.test"),
        fail_code: "invalid_auth".into(),
        ..FakeSlack::workspace()
    });
    let state = test_state(Arc::clone(&fake));

    let out = channels_list::execute(&state, args(json!({ "channel_types": "im" }))).await;

    assert_eq!(out, "Error: invalid_auth");
    assert!(matches!(state.directory.state(), DirectoryState::Empty));
}

#[tokio::test]
async fn env_watcher_starts_from_file_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".env");
    std::fs::write(&path, "SLACK_MCP_XOXP_TOKEN=xoxp-file\n").expect("write env");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watcher = CredentialWatcher::for_env_file(&path, tx).expect("watcher");
    assert_eq!(watcher.path(), path.as_path());

    // Rewriting the tokens the file already held is not a rotation.
    std::fs::write(&path, "SLACK_MCP_XOXP_TOKEN=xoxp-file\n").expect("rewrite env");
    assert!(
        tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .is_err(),
        "unchanged file tokens must not rotate"
    );

    std::fs::write(&path, "SLACK_MCP_XOXP_TOKEN=xoxp-rotated\n").expect("update env");
    let rotated = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("change forwarded")
        .expect("channel open");
    assert_eq!(rotated.user_token.as_deref(), Some("xoxp-rotated"));
}
