// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns per pipeline.
//! - Wiring up a cross-platform filesystem watcher (`notify`), optionally on
//!   the polling backend.
//! - Turning raw notify events into [`ChangeEvent`]s with root-relative
//!   forward-slash paths.
//!
//! It does **not** debounce and it does not know about pipelines' tools; it
//! only turns filesystem changes into per-pipeline change events. Polling
//! backends may deliver duplicated or late events for one logical edit; the
//! debounce layer downstream absorbs those.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use path_utils::{decompose, relative_str, PathParts};
pub use patterns::WatchProfile;
pub use watcher::{spawn_watcher, WatcherHandle};

/// Kind of a filesystem change, reduced to what the pipelines care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
}

/// One change notification, as consumed by the debounce layer.
///
/// `path` is relative to the watched root, with forward slashes. Transient:
/// produced by the watcher, coalesced by the debounce table, consumed by one
/// pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}
