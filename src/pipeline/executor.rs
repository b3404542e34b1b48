// src/pipeline/executor.rs

//! The per-run pipeline state machine.
//!
//! For each settled (debounced) event, strictly in order:
//!
//! 1. **Clean** — remove the prior output location for this input. Stale
//!    outputs from a renamed/removed asset must never linger and be
//!    mistaken for current artifacts. Removing an absent location is a
//!    no-op.
//! 2. **Deletion check** — if the event is a pure removal, stop after
//!    Clean; the run is a cleanup-only success.
//! 3. **Ensure** — recreate the output location; Clean just removed it and
//!    most tools don't create destination directories themselves.
//! 4. **Invoke** — run the external tool and classify its result.
//!
//! Classification precedence: launch/exit failure → `ToolError`; nonempty
//! stderr with exit success → `ToolStderr`; otherwise `Success`. One
//! outcome per run, no retries; the only re-attempt trigger is a later
//! change event.

use std::io::ErrorKind;

use tracing::{error, info, warn};

use crate::session_log::{SessionLogger, Severity};
use crate::watch::{ChangeEvent, ChangeKind};

use super::invoke::ToolInvoker;
use super::spec::PipelineSpec;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Tool ran, exit zero, quiet stderr.
    Success,
    /// Deletion event: Clean ran, Invoke was skipped.
    CleanupOnly,
    /// Clean (or recreating the output location) failed; Invoke never ran.
    /// Treated as a failed run so the user can re-trigger by editing again.
    CleanupFailed(String),
    /// The tool could not be launched or exited nonzero.
    ToolError(String),
    /// Exit zero but diagnostic output present. Not a hard failure.
    ToolStderr(String),
}

/// Execute one settled event through the pipeline state machine and record
/// the outcome in the session log.
///
/// Errors are local to this run: the pipeline stays armed for future events
/// regardless of the outcome.
pub async fn run_pipeline(
    spec: &PipelineSpec,
    event: ChangeEvent,
    invoker: &dyn ToolInvoker,
    logger: &SessionLogger,
) -> RunOutcome {
    info!(
        pipeline = %spec.name,
        path = %event.path,
        kind = ?event.kind,
        "pipeline run starting"
    );

    let outcome = execute(spec, &event, invoker).await;
    log_outcome(spec, &event, &outcome, logger);
    outcome
}

async fn execute(
    spec: &PipelineSpec,
    event: &ChangeEvent,
    invoker: &dyn ToolInvoker,
) -> RunOutcome {
    let output_location = spec.output_location(&event.path);

    // Clean: idempotent removal of the previous outputs for this input.
    if let Some(location) = &output_location {
        match tokio::fs::remove_dir_all(location).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return RunOutcome::CleanupFailed(format!("removing {location}: {err}"));
            }
        }
    }

    // Deletion check: a removed source gets its outputs cleaned, nothing more.
    if event.kind == ChangeKind::Deleted {
        return RunOutcome::CleanupOnly;
    }

    // Ensure: the tool expects its destination to exist.
    if let Some(location) = &output_location {
        if let Err(err) = tokio::fs::create_dir_all(location).await {
            return RunOutcome::CleanupFailed(format!("creating {location}: {err}"));
        }
    }

    // Invoke + classify.
    let args = spec.build_args(&event.path);
    match invoker.invoke(&spec.tool, args).await {
        Err(err) => RunOutcome::ToolError(err.to_string()),
        Ok(output) if !output.success() => RunOutcome::ToolError(format!(
            "exit code {}: {}",
            output.exit_code,
            output.stderr.trim_end()
        )),
        Ok(output) if !output.stderr.trim().is_empty() => {
            RunOutcome::ToolStderr(output.stderr.trim_end().to_string())
        }
        Ok(_) => RunOutcome::Success,
    }
}

fn log_outcome(
    spec: &PipelineSpec,
    event: &ChangeEvent,
    outcome: &RunOutcome,
    logger: &SessionLogger,
) {
    match outcome {
        RunOutcome::Success => {
            info!(pipeline = %spec.name, path = %event.path, "pipeline run succeeded");
            logger.record(
                &spec.name,
                Severity::Info,
                &format!("rebuilt after change to {}", event.path),
            );
        }
        RunOutcome::CleanupOnly => {
            info!(pipeline = %spec.name, path = %event.path, "cleanup-only run");
            logger.record(
                &spec.name,
                Severity::Info,
                &format!("cleaned outputs for deleted {}", event.path),
            );
        }
        RunOutcome::CleanupFailed(msg) => {
            error!(pipeline = %spec.name, path = %event.path, %msg, "cleanup failed");
            logger.record(&format!("{} error", spec.name), Severity::Error, msg);
        }
        RunOutcome::ToolError(msg) => {
            error!(pipeline = %spec.name, path = %event.path, %msg, "tool failed");
            logger.record(&format!("{} error", spec.name), Severity::Error, msg);
        }
        RunOutcome::ToolStderr(msg) => {
            warn!(pipeline = %spec.name, path = %event.path, "tool wrote to stderr");
            logger.record(&format!("{} stderr", spec.name), Severity::Warn, msg);
        }
    }
}
