// src/pipeline/spec.rs

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::config::model::{CoalesceMode, PipelineConfig};
use crate::debounce::DebounceKey;
use crate::watch::path_utils::decompose;
use crate::watch::ChangeEvent;

/// Resolved definition of one pipeline: which tool to run, how to build its
/// argument vector, and where its outputs live.
///
/// Built once from config and shared (read-only) by every run of the
/// pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,
    pub tool: String,
    /// Argument templates; `{input}` / `{output}` resolved per run.
    pub args: Vec<String>,
    /// Per-input output root. `None` means the pipeline owns no output
    /// location and the clean / ensure steps are skipped.
    pub output_dir: Option<String>,
    /// Regex tested against the input's base name to pick the output
    /// naming pattern.
    pub animation_pattern: Option<Regex>,
    /// Output file name template for animation-flagged inputs. May contain
    /// tokens like `{tag}` / `{frame}` that only the tool resolves.
    pub frame_template: String,
    /// Output file name template for everything else.
    pub single_template: String,
    pub coalesce: CoalesceMode,
}

impl PipelineSpec {
    /// Build a spec from one `[pipeline.<name>]` config table.
    pub fn from_config(name: impl Into<String>, cfg: &PipelineConfig) -> Result<Self> {
        let name = name.into();

        let animation_pattern = cfg
            .animation_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .with_context(|| format!("invalid animation_pattern for pipeline {name}"))?;

        let coalesce = CoalesceMode::from_str(&cfg.coalesce).map_err(|e| anyhow!(e))?;

        Ok(Self {
            name,
            tool: cfg.tool.clone(),
            args: cfg.args.clone(),
            output_dir: cfg.output_dir.clone(),
            animation_pattern,
            frame_template: cfg.frame_template.clone(),
            single_template: cfg.single_template.clone(),
            coalesce,
        })
    }

    /// Coalescing key for a change event.
    ///
    /// Per-path pipelines debounce each file independently; pipeline-level
    /// coalescing folds every event into one key so a burst across many
    /// files yields a single run.
    pub fn debounce_key(&self, event: &ChangeEvent) -> DebounceKey {
        match self.coalesce {
            CoalesceMode::PerPath => event.path.clone(),
            CoalesceMode::Pipeline => self.name.clone(),
        }
    }

    /// The output directory owned by this input, if the pipeline has one.
    ///
    /// `art/hero.aseprite` with `output_dir = "exports"` → `exports/hero`.
    pub fn output_location(&self, input: &str) -> Option<String> {
        let dir = self.output_dir.as_ref()?;
        let stem = decompose(input).stem;
        Some(format!("{}/{}", dir.trim_end_matches('/'), stem))
    }

    /// Whether the input's base name matches the animation pattern.
    ///
    /// The test is against the base name only, never the directory, so
    /// `art/ui/hero_walk_animation.aseprite` is animation-flagged while
    /// `art/animation/ui_button.aseprite` is not.
    pub fn is_animation(&self, input: &str) -> bool {
        match &self.animation_pattern {
            Some(re) => re.is_match(&decompose(input).stem),
            None => false,
        }
    }

    /// Resolve the `{output}` placeholder for this input: the output
    /// location joined with the selected file-name template.
    ///
    /// `{stem}` in the template is resolved here; any other token is left
    /// for the tool.
    pub fn output_file(&self, input: &str) -> Option<String> {
        let location = self.output_location(input)?;
        let template = if self.is_animation(input) {
            &self.frame_template
        } else {
            &self.single_template
        };
        let file = template.replace("{stem}", &decompose(input).stem);
        Some(format!("{location}/{file}"))
    }

    /// Construct the argument vector for one run.
    pub fn build_args(&self, input: &str) -> Vec<String> {
        let output = self.output_file(input);

        self.args
            .iter()
            .map(|arg| {
                let arg = arg.replace("{input}", input);
                match &output {
                    Some(output) => arg.replace("{output}", output),
                    None => arg,
                }
            })
            .collect()
    }
}
