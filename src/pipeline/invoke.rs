// src/pipeline/invoke.rs

//! Pluggable tool invocation abstraction.
//!
//! The pipeline executor talks to a [`ToolInvoker`] instead of spawning
//! processes directly. This makes it easy to swap in a fake invoker in tests
//! while keeping the production implementation here.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{BuildwatchError, Result};

/// Captured result of one finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait abstracting how external tools are invoked.
///
/// Production code uses [`ProcessInvoker`]; tests can provide their own
/// implementation that records calls and fabricates outputs.
pub trait ToolInvoker: Send + Sync {
    /// Run `tool` with `args`, capturing stdout and stderr.
    ///
    /// `Err` means the process could not be launched at all
    /// (`ToolLaunch`); a nonzero exit is an `Ok` with the captured output.
    fn invoke(
        &self,
        tool: &str,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>>;
}

/// Real invoker used in production, backed by `tokio::process::Command`.
///
/// No timeout is applied: a hung tool delays that run's classification
/// indefinitely without affecting other keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl ToolInvoker for ProcessInvoker {
    fn invoke(
        &self,
        tool: &str,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        let tool = tool.to_string();

        Box::pin(async move {
            debug!(tool = %tool, ?args, "invoking external tool");

            let output = Command::new(&tool)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|err| {
                    BuildwatchError::ToolLaunch(format!("spawning `{tool}`: {err}"))
                })?;

            Ok(ToolOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
