// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchProfile;
use crate::watch::{ChangeEvent, ChangeKind};

/// Poll interval for the polling backend.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Handle for one pipeline's filesystem watcher.
///
/// This exists mainly so the underlying `notify` watcher is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: Box<dyn Watcher + Send>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and sends a [`ChangeEvent`] for every changed path the
/// profile matches.
///
/// - `root` is the project root against which all glob patterns are evaluated.
/// - `poll` forces the polling backend (duplicate/late events expected).
/// - `profile` is the compiled per-pipeline pattern set.
/// - `event_tx` is the channel into that pipeline's debounce loop.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    poll: bool,
    profile: WatchProfile,
    event_tx: mpsc::UnboundedSender<ChangeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let handler = {
        let raw_tx = raw_tx.clone();
        let name = profile.name().to_string();
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = raw_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("buildwatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("buildwatch: file watch error for pipeline {name}: {err}");
            }
        }
    };

    let mut watcher: Box<dyn Watcher + Send> = if poll {
        Box::new(PollWatcher::new(
            handler,
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?)
    } else {
        Box::new(RecommendedWatcher::new(handler, Config::default())?)
    };

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(
        pipeline = %profile.name(),
        root = ?root,
        poll,
        "file watcher started"
    );

    // Async task that relativizes, classifies and filters raw notify events.
    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            debug!(pipeline = %profile.name(), ?event, "received notify event");

            let Some(kind) = change_kind(&event.kind) else {
                continue;
            };

            for path in &event.paths {
                let Some(rel) = relative_str(&async_root, path) else {
                    warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, async_root
                    );
                    continue;
                };

                if !profile.matches(&rel) {
                    continue;
                }

                debug!(
                    pipeline = %profile.name(),
                    path = %rel,
                    ?kind,
                    "watch match -> change event"
                );

                if event_tx.send(ChangeEvent::new(kind, rel)).is_err() {
                    // If the pipeline loop is gone, there's no point keeping
                    // the watcher loop alive.
                    debug!(pipeline = %profile.name(), "change channel closed");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Reduce a raw notify event kind to the change kinds the pipelines care
/// about. Access-only events are dropped.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        // A rename-away vanishes the old path; treat it like a deletion so
        // the pipeline cleans its outputs instead of rebuilding a missing
        // input. The new path arrives as its own event.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        // Polling backends sometimes report unclassified events.
        EventKind::Any | EventKind::Other => Some(ChangeKind::Modified),
        EventKind::Access(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange};

    #[test]
    fn rename_away_is_classified_as_deletion() {
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(ChangeKind::Deleted)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            Some(ChangeKind::Renamed)
        );
    }

    #[test]
    fn content_changes_map_to_modified_and_access_is_dropped() {
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            Some(ChangeKind::Modified)
        );
        assert_eq!(change_kind(&EventKind::Access(AccessKind::Any)), None);
    }
}
