//! Cached workspace member.

use serde::Serialize;

use crate::slack::types::ApiUser;
use crate::tabular::Record;

/// Workspace member as held in the directory cache.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Slack user ID; the cache key.
    pub user_id: String,
    /// Handle.
    pub user_name: String,
    /// Display real name.
    pub real_name: String,
}

impl User {
    /// Create a user record.
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        real_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            real_name: real_name.into(),
        }
    }

    /// Convert a `users.list` member, or `None` for deactivated accounts.
    #[must_use]
    pub fn from_api(member: &ApiUser) -> Option<Self> {
        if member.deleted || member.id.is_empty() {
            return None;
        }

        let real_name = if member.real_name.is_empty() {
            member
                .profile
                .as_ref()
                .map(|p| p.real_name.clone())
                .unwrap_or_default()
        } else {
            member.real_name.clone()
        };

        Some(Self::new(member.id.clone(), member.name.clone(), real_name))
    }
}

impl Record for User {
    const COLUMNS: &'static [&'static str] = &["userID", "userName", "realName"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.user_name.clone(),
            self.real_name.clone(),
        ]
    }
}
