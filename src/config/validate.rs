// src/config/validate.rs

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use globset::Glob;
use regex::Regex;

use crate::config::model::{CoalesceMode, CompilerConfig, ConfigFile, PipelineConfig};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is a `[compiler]` section or at least one `[pipeline.<name>]`
/// - every glob pattern compiles
/// - every `animation_pattern` regex compiles
/// - debounce windows are at least 1 ms
/// - coalesce modes parse
///
/// It does **not** check that tool executables exist; a missing tool is a
/// per-run failure, reported when the pipeline actually fires.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;

    if let Some(compiler) = &cfg.compiler {
        validate_compiler(compiler)?;
    }

    for (name, pipeline) in cfg.pipeline.iter() {
        validate_pipeline(pipeline).with_context(|| format!("in [pipeline.{name}]"))?;
    }

    Ok(())
}

fn ensure_has_pipelines(cfg: &ConfigFile) -> Result<()> {
    if cfg.compiler.is_none() && cfg.pipeline.is_empty() {
        return Err(anyhow!(
            "config must contain a [compiler] section or at least one [pipeline.<name>] section"
        ));
    }
    Ok(())
}

fn validate_compiler(compiler: &CompilerConfig) -> Result<()> {
    if compiler.command.trim().is_empty() {
        return Err(anyhow!("[compiler] command must not be empty"));
    }
    if compiler.build_file.trim().is_empty() {
        return Err(anyhow!("[compiler] build_file must not be empty"));
    }
    if compiler.port == 0 {
        return Err(anyhow!("[compiler] port must be nonzero"));
    }
    if compiler.debounce_ms == 0 {
        return Err(anyhow!("[compiler] debounce_ms must be at least 1"));
    }
    validate_globs(&compiler.watch).context("in [compiler] watch")?;
    validate_globs(&compiler.exclude).context("in [compiler] exclude")?;
    if compiler.watch.is_empty() {
        return Err(anyhow!("[compiler] watch must contain at least one pattern"));
    }
    Ok(())
}

fn validate_pipeline(pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.tool.trim().is_empty() {
        return Err(anyhow!("tool must not be empty"));
    }
    if pipeline.watch.is_empty() {
        return Err(anyhow!("watch must contain at least one pattern"));
    }
    if pipeline.debounce_ms == 0 {
        return Err(anyhow!("debounce_ms must be at least 1"));
    }

    validate_globs(&pipeline.watch).context("watch pattern")?;
    validate_globs(&pipeline.exclude).context("exclude pattern")?;

    if let Some(pattern) = &pipeline.animation_pattern {
        Regex::new(pattern)
            .with_context(|| format!("invalid animation_pattern: {pattern}"))?;
    }

    CoalesceMode::from_str(&pipeline.coalesce).map_err(|e| anyhow!(e))?;

    if let Some(dir) = &pipeline.output_dir {
        if dir.trim().is_empty() {
            return Err(anyhow!("output_dir must not be empty when present"));
        }
    }

    if pipeline.output_dir.is_none() && pipeline.args.iter().any(|a| a.contains("{output}")) {
        return Err(anyhow!(
            "args reference {{output}} but no output_dir is configured"
        ));
    }

    Ok(())
}

fn validate_globs(patterns: &[String]) -> Result<()> {
    for pat in patterns {
        Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
    }
    Ok(())
}
