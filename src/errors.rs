// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Watch source error: {0}")]
    WatchSource(String),

    #[error("Tool launch error: {0}")]
    ToolLaunch(String),

    #[error("Tool exited with failure: {0}")]
    ToolExit(String),

    #[error("Cleanup error: {0}")]
    Cleanup(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<notify::Error> for BuildwatchError {
    fn from(err: notify::Error) -> Self {
        BuildwatchError::WatchSource(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildwatchError>;
