//! In-memory directory of workspace users and conversations.
//!
//! The cache moves between two states: [`DirectoryState::Empty`] at startup
//! and after a credential rotation, and [`DirectoryState::Loaded`] once a
//! load has run. A loaded snapshot is an immutable `Arc<Directory>`; a reload
//! swaps in a new snapshot rather than editing the old one, so readers never
//! see a half-updated directory.
//!
//! Concurrent first use may load the directory more than once. There is no
//! in-flight deduplication; the last load to finish wins.

pub mod resolver;

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, info_span, warn, Instrument};

use crate::models::channel::{Channel, ChannelKind};
use crate::models::user::User;
use crate::slack::SlackApi;
use crate::Result;

/// Snapshot of users and conversations keyed by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    team: Option<String>,
    users: BTreeMap<String, User>,
    channels: BTreeMap<String, Channel>,
}

impl Directory {
    /// Build a directory from already-converted records.
    pub fn from_parts(
        users: impl IntoIterator<Item = User>,
        channels: impl IntoIterator<Item = Channel>,
    ) -> Self {
        let mut directory = Self::default();
        for user in users {
            directory.insert_user(user);
        }
        for channel in channels {
            directory.insert_channel(channel);
        }
        directory
    }

    /// Workspace name reported by `auth.test`, when loaded from Slack.
    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    /// Look up a user by ID.
    #[must_use]
    pub fn get_user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Look up a conversation by ID.
    #[must_use]
    pub fn get_channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.get(channel_id)
    }

    /// All users, ordered by ID.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// All conversations, ordered by ID.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Number of cached users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of cached conversations.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Insert or replace a user.
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.user_id.clone(), user);
    }

    /// Insert or replace a conversation.
    pub fn insert_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }
}

/// Lifecycle of the directory cache.
#[derive(Debug, Clone, Default)]
pub enum DirectoryState {
    /// Nothing loaded yet, or cleared by a credential rotation.
    #[default]
    Empty,
    /// A snapshot is available.
    Loaded(Arc<Directory>),
}

/// Shared directory cache owned by the application state.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    state: RwLock<DirectoryState>,
}

impl DirectoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DirectoryState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The loaded snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Directory>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            DirectoryState::Loaded(directory) => Some(Arc::clone(directory)),
            DirectoryState::Empty => None,
        }
    }

    /// Install `directory` as the current snapshot, replacing any previous one.
    pub fn install(&self, directory: Directory) -> Arc<Directory> {
        let snapshot = Arc::new(directory);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            DirectoryState::Loaded(Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the current snapshot; the next lookup reloads.
    pub fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = DirectoryState::Empty;
    }

    /// Return the loaded snapshot, loading it from Slack first if empty.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`DirectoryCache::load`].
    pub async fn get_or_load(&self, api: &dyn SlackApi) -> Result<Arc<Directory>> {
        if let Some(snapshot) = self.snapshot() {
            return Ok(snapshot);
        }
        self.load(api).await
    }

    /// Fetch users and every conversation type from Slack and install the
    /// result as the new snapshot.
    ///
    /// `auth.test` runs first; if it fails the cache is left untouched. A
    /// failure during listing still installs whatever was collected before
    /// the failing call, then returns the error.
    ///
    /// # Errors
    ///
    /// Returns the first Slack API error encountered.
    pub async fn load(&self, api: &dyn SlackApi) -> Result<Arc<Directory>> {
        let span = info_span!("directory_load");

        async move {
            let identity = api.auth_test().await?;
            info!(team = %identity.team, user = %identity.user, "authenticated with slack workspace");

            let mut directory = Directory {
                team: Some(identity.team),
                ..Directory::default()
            };
            let outcome = populate(&mut directory, api).await;

            let users = directory.user_count();
            let channels = directory.channel_count();
            let snapshot = self.install(directory);

            match outcome {
                Ok(()) => {
                    info!(users, channels, "directory loaded");
                    Ok(snapshot)
                }
                Err(err) => {
                    warn!(%err, users, channels, "directory load incomplete; keeping partial snapshot");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

async fn populate(directory: &mut Directory, api: &dyn SlackApi) -> Result<()> {
    for member in api.list_users().await? {
        if let Some(user) = User::from_api(&member) {
            directory.insert_user(user);
        }
    }

    // Users load first so DM conversations can be named after their peer.
    for kind in ChannelKind::ALL {
        let listed = api.list_conversations(kind).await?;
        for raw in &listed {
            let channel = Channel::from_api(raw, kind, |peer| {
                directory.get_user(peer).map(|u| u.user_name.clone())
            });
            directory.insert_channel(channel);
        }
    }

    Ok(())
}
