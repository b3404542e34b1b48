// src/config/mod.rs

//! Configuration loading and validation.
//!
//! A `Buildwatch.toml` describes:
//! - `[watch]`: the watched project root and the watch backend.
//! - `[logs]`: where per-label session logs are written.
//! - `[compiler]`: the persistent compile server and the recompile pipeline.
//! - `[pipeline.<name>]`: one table per asset-export pipeline.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    CoalesceMode, CompilerConfig, ConfigFile, LogsSection, PipelineConfig, WatchSection,
};
pub use validate::validate_config;
