//! Resolution of `#channel` / `@person` references to Slack IDs.

use super::Directory;

/// Whether `token` already looks like a conversation ID (`C…`, `D…`, `G…`).
#[must_use]
pub fn is_conversation_id(token: &str) -> bool {
    has_id_shape(token, &['C', 'D', 'G'])
}

/// Whether `token` already looks like a user ID (`U…`, `W…`).
#[must_use]
pub fn is_user_id(token: &str) -> bool {
    has_id_shape(token, &['U', 'W'])
}

fn has_id_shape(token: &str, prefixes: &[char]) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if prefixes.contains(&first) => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Resolve a channel reference to a conversation ID.
///
/// IDs pass through without touching the cache. `#name` matches a channel
/// named `name`; `@name` matches a DM named `@name` or a channel named
/// `name`. Matching is exact. The directory iterates in ID order, so when
/// several conversations share a name the lowest ID wins.
#[must_use]
pub fn resolve_channel_id(directory: &Directory, token: &str) -> Option<String> {
    if is_conversation_id(token) {
        return Some(token.to_owned());
    }

    if let Some(name) = token.strip_prefix('#') {
        return directory
            .channels()
            .find(|c| c.name == name)
            .map(|c| c.id.clone());
    }

    if let Some(name) = token.strip_prefix('@') {
        let dm_name = format!("@{name}");
        return directory
            .channels()
            .find(|c| c.name == dm_name || c.name == name)
            .map(|c| c.id.clone());
    }

    None
}

/// Resolve a channel reference, falling back to the raw token.
#[must_use]
pub fn channel_id_or_raw(directory: &Directory, token: &str) -> String {
    resolve_channel_id(directory, token).unwrap_or_else(|| token.to_owned())
}

/// Resolve `@handle` to a user ID via the cache.
#[must_use]
pub fn resolve_user_id(directory: &Directory, token: &str) -> Option<String> {
    if is_user_id(token) {
        return Some(token.to_owned());
    }
    let handle = token.strip_prefix('@').unwrap_or(token);
    directory
        .users()
        .find(|u| u.user_name == handle)
        .map(|u| u.user_id.clone())
}

/// Normalize a user reference for Slack search operators.
///
/// User IDs become `<@ID>`; handles keep or gain a leading `@`.
#[must_use]
pub fn user_search_reference(token: &str) -> String {
    let token = token.trim();
    if is_user_id(token) {
        format!("<@{token}>")
    } else if token.starts_with('@') {
        token.to_owned()
    } else {
        format!("@{token}")
    }
}
