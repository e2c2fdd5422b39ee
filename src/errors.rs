// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These are errors that stop a run before any script starts (bad job
//! document, unreadable file, ...). Failures that happen while scripts run
//! are reported as values inside the [`crate::engine::JobOutcome`] instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobrunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported job document format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, JobrunnerError>;
