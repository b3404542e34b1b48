// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled watch/exclude glob patterns for a single pipeline.
///
/// The patterns are assumed to be relative to the watched root directory.
/// The watcher passes relative paths (e.g. `"art/hero.aseprite"`) into
/// `matches`.
#[derive(Clone)]
pub struct WatchProfile {
    name: String,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile a profile from raw pattern lists.
    pub fn compile(
        name: impl Into<String>,
        watch: &[String],
        exclude: &[String],
    ) -> Result<Self> {
        let name = name.into();

        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for pipeline {name}"))?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for pipeline {name}"))?,
            )
        };

        Ok(Self {
            name,
            watch_set,
            exclude_set,
        })
    }

    /// Name of the pipeline this profile belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this pipeline should be considered interested in the
    /// given path (relative to the watched root), e.g. `"art/hero.aseprite"`.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
