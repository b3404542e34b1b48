// src/config/model.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// root = "."
/// poll = true
///
/// [logs]
/// dir = "logs"
/// env_tag = "dev"
///
/// [compiler]
/// command = "haxe"
/// build_file = "build.js.hxml"
/// port = 6000
/// watch = ["src/**/*.hx", "res/**"]
///
/// [pipeline.sprites]
/// tool = "aseprite"
/// args = ["-b", "{input}", "--save-as", "{output}"]
/// watch = ["art/**/*.aseprite"]
/// output_dir = "src/art/aseprite_exports"
/// animation_pattern = "_animation$"
/// ```
///
/// All sections are optional and have reasonable defaults, except that the
/// file must declare a `[compiler]` or at least one `[pipeline.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Watched root and watch backend from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// Session-log location from `[logs]`.
    #[serde(default)]
    pub logs: LogsSection,

    /// Compile-server + recompile pipeline from `[compiler]`.
    #[serde(default)]
    pub compiler: Option<CompilerConfig>,

    /// All asset pipelines from `[pipeline.<name>]`.
    ///
    /// Keys are the *pipeline names* (e.g. `"sprites"`, `"tiles"`, `"atlas"`).
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Project root all glob patterns are evaluated against.
    #[serde(default = "default_root")]
    pub root: String,

    /// Force the polling watch backend.
    ///
    /// Useful when the native backend misses events (network shares, some
    /// editors that replace files). Polling may deliver duplicated or late
    /// events; the debounce layer absorbs those.
    #[serde(default)]
    pub poll: bool,
}

fn default_root() -> String {
    ".".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            poll: false,
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    /// Directory the per-label log files are written to.
    #[serde(default = "default_logs_dir")]
    pub dir: String,

    /// Environment tag included in every log record header.
    #[serde(default = "default_env_tag")]
    pub env_tag: String,
}

fn default_logs_dir() -> String {
    "logs".to_string()
}

fn default_env_tag() -> String {
    "dev".to_string()
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
            env_tag: default_env_tag(),
        }
    }
}

/// `[compiler]` section.
///
/// The compiler runs as a persistent background server (`<command> --wait
/// <port>`), and each recompile is a short-lived client invocation against
/// that server (`<command> <build_file> --connect <port> <flags>`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable.
    #[serde(default = "default_compiler_command")]
    pub command: String,

    /// Build-description file passed to each client invocation.
    pub build_file: String,

    /// Numeric connection endpoint shared by server and clients.
    pub port: u16,

    /// Select the release flag set instead of the debug one.
    #[serde(default)]
    pub release: bool,

    /// Flags appended to client invocations when `release = false`.
    #[serde(default = "default_debug_flags")]
    pub debug_flags: Vec<String>,

    /// Flags appended to client invocations when `release = true`.
    #[serde(default)]
    pub release_flags: Vec<String>,

    /// Glob patterns (relative to the watch root) that trigger a recompile.
    #[serde(default = "default_compiler_watch")]
    pub watch: Vec<String>,

    /// Patterns excluded from the compiler watch.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Debounce window in milliseconds.
    #[serde(default = "default_compiler_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_compiler_command() -> String {
    "haxe".to_string()
}

fn default_debug_flags() -> Vec<String> {
    vec!["-debug".to_string()]
}

fn default_compiler_watch() -> Vec<String> {
    vec!["src/**/*.hx".to_string()]
}

fn default_compiler_debounce_ms() -> u64 {
    500
}

/// `[pipeline.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// External tool executable.
    pub tool: String,

    /// Argument template vector.
    ///
    /// `{input}` and `{output}` are resolved by buildwatch; any other
    /// `{...}` tokens (e.g. `{tag}`, `{frame}`, `{slice}`) are passed through
    /// verbatim for the tool to resolve at runtime.
    #[serde(default)]
    pub args: Vec<String>,

    /// Glob patterns (relative to the watch root) this pipeline reacts to.
    pub watch: Vec<String>,

    /// Patterns excluded from this pipeline's watch.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Debounce window in milliseconds.
    #[serde(default = "default_pipeline_debounce_ms")]
    pub debounce_ms: u64,

    /// Root under which each input gets its own output directory
    /// (`<output_dir>/<input stem>/`).
    ///
    /// When omitted, the pipeline has no owned output location and the
    /// clean / ensure steps are skipped.
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Regex tested against the input's base name (extension stripped).
    ///
    /// A match selects `frame_template` for the output file name, otherwise
    /// `single_template` is used.
    #[serde(default)]
    pub animation_pattern: Option<String>,

    /// Output file name template for animation-flagged inputs.
    #[serde(default = "default_frame_template")]
    pub frame_template: String,

    /// Output file name template for everything else.
    #[serde(default = "default_single_template")]
    pub single_template: String,

    /// `"per-path"` (default) or `"pipeline"`.
    ///
    /// Per-path pipelines debounce each changed file independently; a
    /// `"pipeline"` coalesce mode folds every matching change into one key.
    #[serde(default = "default_coalesce")]
    pub coalesce: String,
}

fn default_pipeline_debounce_ms() -> u64 {
    250
}

fn default_frame_template() -> String {
    "{tag}-{frame}.png".to_string()
}

fn default_single_template() -> String {
    "{stem}.png".to_string()
}

fn default_coalesce() -> String {
    "per-path".to_string()
}

/// How change events are folded into debounce keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceMode {
    /// One debounce key per changed path.
    PerPath,
    /// One debounce key for the whole pipeline (used by the compiler).
    Pipeline,
}

impl FromStr for CoalesceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-path" | "per_path" => Ok(CoalesceMode::PerPath),
            "pipeline" => Ok(CoalesceMode::Pipeline),
            other => Err(format!(
                "invalid coalesce mode: {other} (expected \"per-path\" or \"pipeline\")"
            )),
        }
    }
}
