//! Hot-reload watcher for Slack credentials in a `.env` file.
//!
//! [`CredentialWatcher`] uses the `notify` crate to watch the env file for
//! file-system changes. When the file changes it re-reads the three token
//! variables and, if they differ from the last values seen, sends them over
//! an unbounded channel. [`apply_rotations`] drains that channel and swaps
//! the Slack client held by [`AppState`], which also clears the directory
//! cache.
//!
//! The `notify` callback runs on a non-async thread, so it only parses and
//! sends; the rotation itself happens on the tokio side.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SlackCredentials;
use crate::mcp::handler::AppState;
use crate::{AppError, Result};

/// Returns `true` for file-system events that indicate the watched file was
/// written or replaced (create, modify, remove).
fn is_env_change(event: &Event, file_name: Option<&OsString>) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    let touches_file = match file_name {
        Some(name) => event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name.as_os_str())),
        None => true,
    };
    relevant_kind && touches_file
}

/// Decide whether freshly read credentials should be forwarded.
///
/// Incomplete credentials are ignored so that a half-written file does not
/// disconnect a working client.
fn should_forward(last: &mut Option<SlackCredentials>, fresh: SlackCredentials) -> Option<SlackCredentials> {
    if fresh.auth().is_none() {
        debug!("env file has no usable slack credentials; ignoring change");
        return None;
    }
    if last.as_ref() == Some(&fresh) {
        debug!("slack credentials unchanged");
        return None;
    }
    *last = Some(fresh.clone());
    Some(fresh)
}

/// File-system watcher that reports changed Slack credentials.
///
/// Dropping a `CredentialWatcher` stops the underlying OS watch, so callers
/// must keep it alive for as long as rotation is wanted.
pub struct CredentialWatcher {
    /// Underlying notify watcher, kept alive by owning it here.
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl CredentialWatcher {
    /// Watch `env_path`, sending changed credentials to `sender`.
    ///
    /// `initial` is the credential set the server started with; a change
    /// that reproduces it is not forwarded.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the `notify` watcher cannot be created
    /// or the path cannot be watched.
    pub fn new(
        env_path: &Path,
        initial: Option<SlackCredentials>,
        sender: UnboundedSender<SlackCredentials>,
    ) -> Result<Self> {
        let path: PathBuf = env_path.to_path_buf();
        let file_name = path.file_name().map(OsString::from);
        let last_seen = Mutex::new(initial);
        let path_for_callback = path.clone();

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) if is_env_change(&event, file_name.as_ref()) => {
                    match SlackCredentials::from_env_file(&path_for_callback) {
                        Ok(fresh) => {
                            let mut last = last_seen.lock().unwrap_or_else(PoisonError::into_inner);
                            if let Some(changed) = should_forward(&mut last, fresh) {
                                info!(path = %path_for_callback.display(), "slack credentials changed on disk");
                                if sender.send(changed).is_err() {
                                    warn!("credential receiver dropped; change not applied");
                                }
                            }
                        }
                        Err(err) => {
                            warn!(
                                %err,
                                path = %path_for_callback.display(),
                                "failed to re-read env file; keeping current credentials"
                            );
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "env file watcher error");
                }
                _ => {}
            },
        )
        .map_err(|err| AppError::Config(format!("failed to create env file watcher: {err}")))?;

        // Watch the parent directory so editor rename-on-save is seen.
        let watch_target = path
            .parent()
            .filter(|p| p != &Path::new(""))
            .unwrap_or(Path::new("."));

        watcher
            .watch(watch_target, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::Config(format!(
                    "failed to watch env path '{}': {err}",
                    watch_target.display()
                ))
            })?;

        info!(path = %path.display(), "credential watcher started");

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    /// Watch `env_path`, seeded with the credentials the file holds now.
    ///
    /// Rotation then tracks the file alone: a token that came from the
    /// keychain at startup is only replaced once the file's tokens change.
    ///
    /// # Errors
    ///
    /// See [`CredentialWatcher::new`].
    pub fn for_env_file(
        env_path: &Path,
        sender: UnboundedSender<SlackCredentials>,
    ) -> Result<Self> {
        let initial = match SlackCredentials::from_env_file(env_path) {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                warn!(%err, "env file unreadable at startup; first readable change rotates");
                None
            }
        };
        Self::new(env_path, initial, sender)
    }

    /// The env file being watched.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Apply credential changes to `state` until the channel closes or `ct` fires.
pub async fn apply_rotations(
    state: Arc<AppState>,
    mut receiver: UnboundedReceiver<SlackCredentials>,
    ct: CancellationToken,
) {
    loop {
        tokio::select! {
            () = ct.cancelled() => break,
            next = receiver.recv() => {
                let Some(credentials) = next else { break };
                if let Err(err) = state.rotate_credentials(&credentials) {
                    error!(%err, "failed to rotate slack credentials");
                }
            }
        }
    }
    debug!("credential rotation loop stopped");
}
