//! Contract tests for the advertised directory resources.

use slack_mcp_server::mcp::resources::directory::{list_resources, CHANNELS_URI, USERS_URI};

#[test]
fn resource_uris_are_stable() {
    assert_eq!(CHANNELS_URI, "slack://workspace/channels");
    assert_eq!(USERS_URI, "slack://workspace/users");
}

#[test]
fn both_directories_listed_as_csv() {
    let listed = list_resources();
    let uris: Vec<&str> = listed.resources.iter().map(|r| r.raw.uri.as_str()).collect();
    assert_eq!(uris, vec![CHANNELS_URI, USERS_URI]);

    for resource in &listed.resources {
        assert_eq!(resource.raw.mime_type.as_deref(), Some("text/csv"));
        assert!(resource.raw.description.is_some());
    }
}

#[test]
fn listing_is_not_paginated() {
    assert!(list_resources().next_cursor.is_none());
}
