// src/session_log.rs

//! Per-label session log files for pipeline outcomes.
//!
//! One file per label under the configured logs directory. The first record
//! successfully written for a label in this process truncates the file;
//! every later record for the same label appends. A failed first write
//! leaves the truncation pending, so the next attempt truncates instead of
//! appending after stale content. A restart therefore starts each touched
//! label's file fresh, while untouched labels keep their previous contents.
//!
//! Writing a record can never fail from the caller's point of view: IO
//! errors are reported on stderr and swallowed, so logging cannot crash a
//! pipeline.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

/// Severity classification carried in each record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Session-scoped log sink, one instance per orchestrator.
///
/// The truncation state is owned by the instance (not module-global), so
/// independent orchestrators in one process don't interfere. The mutex also
/// serializes physical writes when several pipelines record concurrently.
pub struct SessionLogger {
    dir: PathBuf,
    env_tag: String,
    truncated: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLogger")
            .field("dir", &self.dir)
            .field("env_tag", &self.env_tag)
            .finish_non_exhaustive()
    }
}

impl SessionLogger {
    pub fn new(dir: impl Into<PathBuf>, env_tag: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            env_tag: env_tag.into(),
            truncated: Mutex::new(HashSet::new()),
        }
    }

    /// Append a record for `label`, truncating the label's file if this is
    /// the first record for it this session.
    ///
    /// Infallible by contract: failures go to stderr only.
    pub fn record(&self, label: &str, severity: Severity, detail: &str) {
        let mut truncated = self
            .truncated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let first_write = !truncated.contains(label);

        // Latch the label only once the truncating write actually landed;
        // a swallowed failure must not turn later records into appends
        // after stale prior-session content.
        match self.write_record(label, severity, detail, first_write) {
            Ok(()) => {
                if first_write {
                    truncated.insert(label.to_string());
                }
            }
            Err(err) => {
                eprintln!("buildwatch: failed to write log record for {label}: {err}");
            }
        }
    }

    /// Path of the backing file for a label.
    ///
    /// Spaces and path separators in the label fold into dashes, so every
    /// label maps to a single file directly under the logs directory.
    pub fn file_for(&self, label: &str) -> PathBuf {
        self.dir
            .join(format!("{}.log", label.replace([' ', '/', '\\'], "-")))
    }

    fn write_record(
        &self,
        label: &str,
        severity: Severity,
        detail: &str,
        truncate: bool,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.file_for(label);
        let mut file = open_session_file(&path, truncate)?;

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(
            file,
            "[{}] {} ({}) {}",
            label.to_uppercase(),
            severity,
            self.env_tag,
            timestamp
        )?;
        writeln!(file, "{}", detail.trim_end())?;
        writeln!(file)?;

        Ok(())
    }
}

fn open_session_file(path: &Path, truncate: bool) -> std::io::Result<std::fs::File> {
    if truncate {
        OpenOptions::new().create(true).write(true).truncate(true).open(path)
    } else {
        OpenOptions::new().create(true).append(true).open(path)
    }
}
