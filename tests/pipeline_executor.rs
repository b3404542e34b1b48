mod common;
use crate::common::fake_tool::FakeInvoker;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use buildwatch::config::PipelineConfig;
use buildwatch::pipeline::{run_pipeline, PipelineSpec, RunOutcome, ToolOutput};
use buildwatch::session_log::SessionLogger;
use buildwatch::watch::{ChangeEvent, ChangeKind};

type TestResult = Result<(), Box<dyn Error>>;

fn pipeline_config(output_dir: Option<String>) -> PipelineConfig {
    PipelineConfig {
        tool: "aseprite".to_string(),
        args: vec![
            "-b".to_string(),
            "{input}".to_string(),
            "--save-as".to_string(),
            "{output}".to_string(),
        ],
        watch: vec!["art/**/*.aseprite".to_string()],
        exclude: vec![],
        debounce_ms: 250,
        output_dir,
        animation_pattern: Some("_animation$".to_string()),
        frame_template: "{tag}-{frame}.png".to_string(),
        single_template: "{stem}.png".to_string(),
        coalesce: "per-path".to_string(),
    }
}

fn sprites_spec(output_dir: Option<String>) -> PipelineSpec {
    PipelineSpec::from_config("sprites", &pipeline_config(output_dir)).expect("valid spec")
}

#[tokio::test]
async fn deletion_runs_cleanup_only() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let exports = tmp.path().join("exports");
    let location = exports.join("sprite");
    std::fs::create_dir_all(&location)?;
    std::fs::write(location.join("stale.png"), b"old")?;

    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::succeeding();
    let spec = sprites_spec(Some(exports.to_string_lossy().into_owned()));

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Deleted, "art/sprite.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert_eq!(outcome, RunOutcome::CleanupOnly);
    assert!(!location.exists());
    assert!(invoker.calls().is_empty(), "invoke must not run on deletion");

    let log = std::fs::read_to_string(logger.file_for("sprites"))?;
    assert!(log.contains("cleaned outputs for deleted art/sprite.aseprite"));

    Ok(())
}

#[tokio::test]
async fn clean_precedes_invoke_and_output_location_exists_at_invoke_time() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let exports = tmp.path().join("exports");
    let location = exports.join("hero");
    std::fs::create_dir_all(&location)?;
    let stale = location.join("stale.png");
    std::fs::write(&stale, b"old")?;

    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let spec = sprites_spec(Some(exports.to_string_lossy().into_owned()));

    let hook_location = location.clone();
    let hook_stale = stale.clone();
    let invoker = FakeInvoker::succeeding().with_hook(move |_call| {
        // At invoke time the location was cleaned and recreated.
        assert!(hook_location.is_dir());
        assert!(!hook_stale.exists());
    });

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert_eq!(outcome, RunOutcome::Success);

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tool, "aseprite");
    assert_eq!(calls[0].args[0], "-b");
    assert_eq!(calls[0].args[1], "art/hero.aseprite");
    assert!(calls[0].args[3].ends_with("exports/hero/hero.png"));

    Ok(())
}

#[tokio::test]
async fn clean_on_absent_location_is_a_noop() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let exports = tmp.path().join("exports");

    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::succeeding();
    let spec = sprites_spec(Some(exports.to_string_lossy().into_owned()));

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert_eq!(outcome, RunOutcome::Success);
    assert!(exports.join("hero").is_dir());

    Ok(())
}

#[tokio::test]
async fn quiet_stderr_with_zero_exit_is_tool_stderr_not_failure() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::with_output(ToolOutput {
        exit_code: 0,
        stdout: String::new(),
        stderr: "palette index out of range\n".to_string(),
    });
    let spec = sprites_spec(None);

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert_eq!(
        outcome,
        RunOutcome::ToolStderr("palette index out of range".to_string())
    );

    // Logged under the dedicated stderr label.
    let log = std::fs::read_to_string(logger.file_for("sprites stderr"))?;
    assert!(log.contains("[SPRITES STDERR]"));
    assert!(log.contains("palette index out of range"));

    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_tool_error() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::with_output(ToolOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: "no such layer".to_string(),
    });
    let spec = sprites_spec(None);

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert!(matches!(outcome, RunOutcome::ToolError(ref msg) if msg.contains("exit code 1")));

    let log = std::fs::read_to_string(logger.file_for("sprites error"))?;
    assert!(log.contains("no such layer"));

    Ok(())
}

#[tokio::test]
async fn launch_failure_is_tool_error_and_pipeline_stays_armed() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::failing_launch("No such file or directory");
    let spec = sprites_spec(None);

    let event = ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite");
    let outcome = run_pipeline(&spec, event.clone(), &invoker, &logger).await;
    assert!(matches!(outcome, RunOutcome::ToolError(_)));

    // A later event re-attempts; nothing is latched.
    let outcome = run_pipeline(&spec, event, &invoker, &logger).await;
    assert!(matches!(outcome, RunOutcome::ToolError(_)));
    assert_eq!(invoker.calls().len(), 2);

    Ok(())
}

#[tokio::test]
async fn failed_clean_aborts_run_before_invoke() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let exports = tmp.path().join("exports");
    std::fs::create_dir_all(&exports)?;
    // The output location exists as a *file*, so remove_dir_all fails.
    std::fs::write(exports.join("hero"), b"not a directory")?;

    let logger = SessionLogger::new(tmp.path().join("logs"), "test");
    let invoker = FakeInvoker::succeeding();
    let spec = sprites_spec(Some(exports.to_string_lossy().into_owned()));

    let outcome = run_pipeline(
        &spec,
        ChangeEvent::new(ChangeKind::Modified, "art/hero.aseprite"),
        &invoker,
        &logger,
    )
    .await;

    assert!(matches!(outcome, RunOutcome::CleanupFailed(_)));
    assert!(invoker.calls().is_empty());
    assert!(Path::new(&logger.file_for("sprites error")).exists());

    Ok(())
}
