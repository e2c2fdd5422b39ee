// src/engine/mod.rs

//! Orchestration engine for jobrunner.
//!
//! This module ties together:
//! - the task executor, which runs one task (single script or serial chain)
//! - the job coordinator, which fans tasks out concurrently and joins them
//! - the outcome types every run ends in
//!
//! Actual process execution is delegated to an
//! [`ExecutorBackend`](crate::exec::ExecutorBackend).

pub mod coordinator;
pub mod outcome;
pub mod task;

pub use coordinator::JobCoordinator;
pub use outcome::{
    CapturedOutput, EngineError, FailedStep, JobOutcome, ScriptError, ScriptOutcome, ScriptStatus,
    TaskFailure, TaskKind, TaskOutcome,
};
pub use task::{TaskState, run_task};
