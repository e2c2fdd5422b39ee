// src/config/mod.rs

//! Job document model, loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a job document from disk as TOML or JSON, and describe it as a
//!   JSON Schema (`loader.rs`).
//! - Validate what the closed-world schema alone cannot express (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DocumentFormat, job_schema, load_and_validate, load_from_path, parse_str};
pub use model::{Destination, Environment, Execution, Job, RawJob, Script, Shell, Task};
