// src/compiler.rs

//! Compile-server bootstrap and the recompile pipeline.
//!
//! The compiler toolchain runs as a persistent background server
//! (`<command> --wait <port>`) started once at startup. Each recompile is a
//! short-lived client invocation against that server, parameterized by the
//! build-description file, the connection port and the environment-selected
//! flag set. The recompile itself is just a [`PipelineSpec`] with no owned
//! output location and pipeline-level coalescing.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::config::model::{CoalesceMode, CompilerConfig};
use crate::errors::{BuildwatchError, Result};
use crate::pipeline::PipelineSpec;
use crate::watch::{ChangeEvent, ChangeKind};

/// Guard for the long-lived compile server process.
///
/// Dropping the guard kills the server (`kill_on_drop`).
pub struct CompilerServer {
    _child: Child,
}

impl std::fmt::Debug for CompilerServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerServer").finish()
    }
}

/// One-time server handshake, performed before the first scheduled compile.
pub async fn start_server(cfg: &CompilerConfig) -> Result<CompilerServer> {
    let child = Command::new(&cfg.command)
        .arg("--wait")
        .arg(cfg.port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            BuildwatchError::ToolLaunch(format!(
                "spawning compile server `{} --wait {}`: {err}",
                cfg.command, cfg.port
            ))
        })?;

    info!(command = %cfg.command, port = cfg.port, "compile server started");

    Ok(CompilerServer { _child: child })
}

/// The recompile pipeline: `<command> <build_file> --connect <port> <flags>`.
pub fn compile_spec(cfg: &CompilerConfig) -> PipelineSpec {
    let mut args = vec![
        cfg.build_file.clone(),
        "--connect".to_string(),
        cfg.port.to_string(),
    ];

    let flags = if cfg.release {
        &cfg.release_flags
    } else {
        &cfg.debug_flags
    };
    args.extend(flags.iter().cloned());

    PipelineSpec {
        name: "compile".to_string(),
        tool: cfg.command.clone(),
        args,
        output_dir: None,
        animation_pattern: None,
        frame_template: String::new(),
        single_template: String::new(),
        coalesce: CoalesceMode::Pipeline,
    }
}

/// Synthetic event used for the initial compile at startup.
pub fn initial_event(cfg: &CompilerConfig) -> ChangeEvent {
    ChangeEvent::new(ChangeKind::Modified, cfg.build_file.clone())
}
