// src/config/loader.rs

use std::fs;
use std::path::Path;

use schemars::Schema;

use crate::config::model::{Job, RawJob};
use crate::errors::{JobrunnerError, Result};

/// Encoding of a job document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension. Files without an extension
    /// are read as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(DocumentFormat::Toml),
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "toml" => Ok(DocumentFormat::Toml),
                "json" => Ok(DocumentFormat::Json),
                other => Err(JobrunnerError::UnsupportedFormat(format!(
                    "'.{other}' (expected .toml or .json)"
                ))),
            },
        }
    }
}

/// Parse a job document from a string without validating it.
pub fn parse_str(contents: &str, format: DocumentFormat) -> Result<RawJob> {
    let raw = match format {
        DocumentFormat::Toml => toml::from_str(contents)?,
        DocumentFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a job document from a given path and return the raw `RawJob`.
///
/// This only performs deserialization (which already rejects unknown keys
/// and missing fields); use [`load_and_validate`] for the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJob> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;

    parse_str(&contents, format)
}

/// Load a job document from path and run validation.
///
/// This is the recommended entry point for the rest of the application. Any
/// error returned here is a configuration error: nothing has been executed.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Job> {
    let raw = load_from_path(&path)?;
    let job = Job::try_from(raw)?;
    Ok(job)
}

/// JSON Schema of the job document.
///
/// Unknown keys are disallowed (`additionalProperties: false`) and every
/// `Script` field is required, matching what [`parse_str`] accepts.
pub fn job_schema() -> Schema {
    schemars::schema_for!(RawJob)
}
