//! Unit tests for the directory cache lifecycle.

use std::sync::Mutex;

use slack_mcp_server::directory::{Directory, DirectoryCache, DirectoryState};
use slack_mcp_server::models::channel::{Channel, ChannelKind};
use slack_mcp_server::models::user::User;
use slack_mcp_server::slack::types::{
    ApiChannel, ApiUser, AuthIdentity, HistoryRequest, MessagePage, PostMessageRequest,
    PostedMessage, RepliesRequest, SearchPage, SearchRequest,
};
use slack_mcp_server::slack::{SlackApi, SlackFuture};
use slack_mcp_server::AppError;

/// Minimal workspace: two users, one channel per kind, optional failure.
#[derive(Default)]
struct Workspace {
    fail_on: Option<ChannelKind>,
    fail_auth: bool,
    loads: Mutex<u32>,
}

impl SlackApi for Workspace {
    fn auth_test(&self) -> SlackFuture<'_, AuthIdentity> {
        Box::pin(async move {
            *self.loads.lock().unwrap() += 1;
            if self.fail_auth {
                return Err(AppError::Slack("invalid_auth".into()));
            }
            Ok(AuthIdentity {
                team: "Acme".into(),
                ..AuthIdentity::default()
            })
        })
    }

    fn list_users(&self) -> SlackFuture<'_, Vec<ApiUser>> {
        Box::pin(async move {
            Ok(vec![
                ApiUser {
                    id: "U1".into(),
                    name: "alice".into(),
                    real_name: "Alice A".into(),
                    ..ApiUser::default()
                },
                ApiUser {
                    id: "U2".into(),
                    name: "gone".into(),
                    deleted: true,
                    ..ApiUser::default()
                },
            ])
        })
    }

    fn list_conversations(&self, kind: ChannelKind) -> SlackFuture<'_, Vec<ApiChannel>> {
        Box::pin(async move {
            if self.fail_on == Some(kind) {
                return Err(AppError::Slack("missing_scope".into()));
            }
            let channel = match kind {
                ChannelKind::PublicChannel => ApiChannel {
                    id: "C1".into(),
                    name: Some("general".into()),
                    num_members: Some(12),
                    ..ApiChannel::default()
                },
                ChannelKind::PrivateChannel => ApiChannel {
                    id: "G1".into(),
                    name: Some("secret".into()),
                    num_members: Some(3),
                    ..ApiChannel::default()
                },
                ChannelKind::Mpim => ApiChannel {
                    id: "G2".into(),
                    name: Some("mpdm-alice--bob-1".into()),
                    num_members: Some(2),
                    ..ApiChannel::default()
                },
                ChannelKind::Im => ApiChannel {
                    id: "D1".into(),
                    user: Some("U1".into()),
                    ..ApiChannel::default()
                },
            };
            Ok(vec![channel])
        })
    }

    fn conversations_history(&self, _: HistoryRequest) -> SlackFuture<'_, MessagePage> {
        Box::pin(async { Ok(MessagePage::default()) })
    }

    fn conversations_replies(&self, _: RepliesRequest) -> SlackFuture<'_, MessagePage> {
        Box::pin(async { Ok(MessagePage::default()) })
    }

    fn search_messages(&self, _: SearchRequest) -> SlackFuture<'_, SearchPage> {
        Box::pin(async { Ok(SearchPage::default()) })
    }

    fn post_message(&self, _: PostMessageRequest) -> SlackFuture<'_, PostedMessage> {
        Box::pin(async { Ok(PostedMessage::default()) })
    }

    fn mark_conversation(&self, _: String, _: String) -> SlackFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn load_collects_users_and_every_kind() {
    let cache = DirectoryCache::new();
    let directory = cache.load(&Workspace::default()).await.expect("load");

    assert_eq!(directory.team(), Some("Acme"));
    assert_eq!(directory.user_count(), 1, "deleted users are skipped");
    assert_eq!(directory.channel_count(), 4);
    assert_eq!(directory.get_channel("D1").unwrap().name, "@alice");
    assert_eq!(directory.get_channel("D1").unwrap().member_count, 1);
    assert_eq!(directory.get_channel("G2").unwrap().kind, ChannelKind::Mpim);
    assert!(matches!(cache.state(), DirectoryState::Loaded(_)));
}

#[tokio::test]
async fn get_or_load_reuses_snapshot() {
    let cache = DirectoryCache::new();
    let api = Workspace::default();

    let first = cache.get_or_load(&api).await.expect("first");
    let second = cache.get_or_load(&api).await.expect("second");

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(*api.loads.lock().unwrap(), 1);
}

#[tokio::test]
async fn partial_load_keeps_what_was_collected() {
    let cache = DirectoryCache::new();
    let api = Workspace {
        fail_on: Some(ChannelKind::Mpim),
        ..Workspace::default()
    };

    let err = cache.load(&api).await.unwrap_err();
    assert_eq!(err.detail(), "missing_scope");

    let snapshot = cache.snapshot().expect("partial snapshot installed");
    assert!(snapshot.get_channel("C1").is_some());
    assert!(snapshot.get_channel("G1").is_some());
    assert!(snapshot.get_channel("G2").is_none());
    assert!(snapshot.get_channel("D1").is_none());
}

#[tokio::test]
async fn failed_auth_leaves_cache_empty() {
    let cache = DirectoryCache::new();
    let api = Workspace {
        fail_auth: true,
        ..Workspace::default()
    };

    assert!(cache.load(&api).await.is_err());
    assert!(matches!(cache.state(), DirectoryState::Empty));
}

#[tokio::test]
async fn clear_forces_reload() {
    let cache = DirectoryCache::new();
    let api = Workspace::default();

    cache.get_or_load(&api).await.expect("load");
    cache.clear();
    assert!(cache.snapshot().is_none());

    cache.get_or_load(&api).await.expect("reload");
    assert_eq!(*api.loads.lock().unwrap(), 2);
}

#[test]
fn install_replaces_snapshot() {
    let cache = DirectoryCache::new();
    cache.install(Directory::from_parts(vec![User::new("U1", "alice", "")], Vec::<Channel>::new()));
    cache.install(Directory::from_parts(vec![User::new("U2", "bob", "")], Vec::<Channel>::new()));

    let snapshot = cache.snapshot().unwrap();
    assert!(snapshot.get_user("U1").is_none());
    assert_eq!(snapshot.get_user("U2").unwrap().user_name, "bob");
    assert!(snapshot.team().is_none());
}

#[test]
fn iteration_is_ordered_by_id() {
    let directory = Directory::from_parts(
        vec![User::new("U9", "zed", ""), User::new("U1", "amy", "")],
        Vec::<Channel>::new(),
    );
    let ids: Vec<&str> = directory.users().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["U1", "U9"]);
}
