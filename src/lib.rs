// src/lib.rs

pub mod cli;
pub mod compiler;
pub mod config;
pub mod debounce;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod session_log;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::pipeline::{run_pipeline, watch_and_run, PipelineSpec, ProcessInvoker, ToolInvoker};
use crate::session_log::SessionLogger;
use crate::watch::{spawn_watcher, WatchProfile, WatcherHandle};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the session logger
/// - the one-time compile-server handshake + initial compile
/// - one independent watch → debounce → execute loop per pipeline
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = PathBuf::from(&cfg.watch.root);
    let logger = Arc::new(SessionLogger::new(&cfg.logs.dir, &cfg.logs.env_tag));
    let invoker: Arc<dyn ToolInvoker> = Arc::new(ProcessInvoker);

    let mut handles = Vec::new();

    // Compile server + recompile pipeline.
    let _server = match &cfg.compiler {
        Some(compiler_cfg) => {
            let server = match compiler::start_server(compiler_cfg).await {
                Ok(server) => Some(server),
                Err(err) => {
                    // Keep watching; each recompile will fail per-run until
                    // the server is available again.
                    error!(error = %err, "failed to start compile server");
                    None
                }
            };

            let spec = Arc::new(compiler::compile_spec(compiler_cfg));

            // Initial compile before any change arrives.
            {
                let spec = Arc::clone(&spec);
                let invoker = Arc::clone(&invoker);
                let logger = Arc::clone(&logger);
                let event = compiler::initial_event(compiler_cfg);
                tokio::spawn(async move {
                    run_pipeline(&spec, event, invoker.as_ref(), &logger).await;
                });
            }

            let profile =
                WatchProfile::compile("compile", &compiler_cfg.watch, &compiler_cfg.exclude)?;
            handles.push(spawn_pipeline(
                spec,
                Duration::from_millis(compiler_cfg.debounce_ms),
                &root,
                cfg.watch.poll,
                profile,
                Arc::clone(&invoker),
                Arc::clone(&logger),
            )?);

            server
        }
        None => None,
    };

    // Asset pipelines.
    for (name, pipeline_cfg) in cfg.pipeline.iter() {
        let spec = Arc::new(PipelineSpec::from_config(name, pipeline_cfg)?);
        let profile = WatchProfile::compile(name, &pipeline_cfg.watch, &pipeline_cfg.exclude)?;
        handles.push(spawn_pipeline(
            spec,
            Duration::from_millis(pipeline_cfg.debounce_ms),
            &root,
            cfg.watch.poll,
            profile,
            Arc::clone(&invoker),
            Arc::clone(&logger),
        )?);
    }

    info!(pipelines = handles.len(), "buildwatch started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested; stopping pipelines");

    // Dropping the watcher handles stops the change sources; aborting the
    // loops cancels every pending debounce timer without firing.
    for handle in handles {
        handle.task.abort();
    }

    Ok(())
}

/// One running pipeline instance: its change source and its debounce loop.
///
/// Instances are fully independent; a failure or stall in one never blocks
/// or delays debounced events for any other.
#[derive(Debug)]
pub struct PipelineHandle {
    _watcher: WatcherHandle,
    pub task: tokio::task::JoinHandle<()>,
}

/// Wire one `(watch pattern, debounce delay, pipeline definition)` triple.
pub fn spawn_pipeline(
    spec: Arc<PipelineSpec>,
    delay: Duration,
    root: &Path,
    poll: bool,
    profile: WatchProfile,
    invoker: Arc<dyn ToolInvoker>,
    logger: Arc<SessionLogger>,
) -> Result<PipelineHandle> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let watcher = spawn_watcher(root.to_path_buf(), poll, profile, event_tx)?;

    debug!(pipeline = %spec.name, ?delay, "pipeline loop starting");
    let task = tokio::spawn(watch_and_run(spec, delay, event_rx, invoker, logger));

    Ok(PipelineHandle {
        _watcher: watcher,
        task,
    })
}

/// Simple dry-run output: print the resolved pipelines.
fn print_dry_run(cfg: &ConfigFile) {
    println!("buildwatch dry-run");
    println!("  watch.root = {}", cfg.watch.root);
    println!("  watch.poll = {}", cfg.watch.poll);
    println!("  logs.dir = {}", cfg.logs.dir);
    println!("  logs.env_tag = {}", cfg.logs.env_tag);
    println!();

    if let Some(compiler_cfg) = &cfg.compiler {
        println!("compiler:");
        println!("      command: {}", compiler_cfg.command);
        println!("      build_file: {}", compiler_cfg.build_file);
        println!("      port: {}", compiler_cfg.port);
        println!("      release: {}", compiler_cfg.release);
        println!("      watch: {:?}", compiler_cfg.watch);
        if !compiler_cfg.exclude.is_empty() {
            println!("      exclude: {:?}", compiler_cfg.exclude);
        }
        println!("      debounce_ms: {}", compiler_cfg.debounce_ms);
    }

    println!("pipelines ({}):", cfg.pipeline.len());
    for (name, pipeline_cfg) in cfg.pipeline.iter() {
        println!("  - {name}");
        println!("      tool: {}", pipeline_cfg.tool);
        println!("      args: {:?}", pipeline_cfg.args);
        println!("      watch: {:?}", pipeline_cfg.watch);
        if !pipeline_cfg.exclude.is_empty() {
            println!("      exclude: {:?}", pipeline_cfg.exclude);
        }
        println!("      debounce_ms: {}", pipeline_cfg.debounce_ms);
        if let Some(dir) = &pipeline_cfg.output_dir {
            println!("      output_dir: {dir}");
        }
        if let Some(pattern) = &pipeline_cfg.animation_pattern {
            println!("      animation_pattern: {pattern}");
        }
        println!("      coalesce: {}", pipeline_cfg.coalesce);
    }

    debug!("dry-run complete (no execution)");
}
