// src/pipeline/mod.rs

//! Pipeline definitions and execution.
//!
//! A pipeline is one watch-pattern + debounce + external-tool-invocation
//! unit (compiler, sprite exporter, tile exporter, atlas packer). This
//! module is responsible for:
//! - the per-pipeline [`PipelineSpec`] (tool, argument templates, output
//!   naming),
//! - the debounce loop that folds change events into settled runs,
//! - the per-run state machine (clean → ensure → invoke → classify → log).

pub mod executor;
pub mod invoke;
pub mod spec;

pub use executor::{run_pipeline, RunOutcome};
pub use invoke::{ProcessInvoker, ToolInvoker, ToolOutput};
pub use spec::PipelineSpec;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::DebounceTable;
use crate::session_log::SessionLogger;
use crate::watch::ChangeEvent;

/// Drive one pipeline instance: fold incoming change events through the
/// debounce table and execute a run for every settled key.
///
/// Runs are spawned as independent tasks, so a slow or hung tool never
/// blocks debouncing of further events — for this pipeline or any other.
/// A superseded run's subprocess is deliberately not cancelled; it finishes
/// and its outcome is still logged (scheduling of *new* runs is what the
/// debounce window suppresses).
///
/// The loop ends when the event channel closes; all pending timers are
/// cancelled without firing.
pub async fn watch_and_run(
    spec: Arc<PipelineSpec>,
    delay: Duration,
    mut events: mpsc::UnboundedReceiver<ChangeEvent>,
    invoker: Arc<dyn ToolInvoker>,
    logger: Arc<SessionLogger>,
) {
    let (mut table, mut ticks) = DebounceTable::new(delay);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        let key = spec.debounce_key(&event);
                        debug!(
                            pipeline = %spec.name,
                            key = %key,
                            kind = ?event.kind,
                            "change event -> debounce"
                        );
                        table.schedule(key, event);
                    }
                    None => {
                        debug!(pipeline = %spec.name, "change channel closed; stopping");
                        table.cancel_all();
                        break;
                    }
                }
            }
            Some(tick) = ticks.recv() => {
                if let Some(event) = table.take_settled(&tick) {
                    let spec = Arc::clone(&spec);
                    let invoker = Arc::clone(&invoker);
                    let logger = Arc::clone(&logger);
                    tokio::spawn(async move {
                        run_pipeline(&spec, event, invoker.as_ref(), &logger).await;
                    });
                }
            }
        }
    }
}
