// src/engine/outcome.rs

//! Outcome values produced by a job run.
//!
//! Nothing that happens after a job starts is raised as an `Err`: every
//! script, task and job ends in one of these values so a caller always gets
//! a complete report.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::Destination;

/// A script could not be started (or tracked) at all.
///
/// Distinct from a script that started and exited non-zero, which is
/// [`ScriptError::ScriptFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    #[error("failed to start '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("failed to stage script body: {reason}")]
    Staging { reason: String },

    #[error("lost track of '{program}' while waiting for it: {reason}")]
    WaitFailed { program: String, reason: String },

    #[error("host '{host}' is unreachable: {detail}")]
    HostUnreachable { host: String, detail: String },

    #[error("authentication to '{host}' failed: {detail}")]
    AuthFailed { host: String, detail: String },

    #[error("remote shell transport to '{host}' failed: {detail}")]
    Transport { host: String, detail: String },

    #[error("task aborted before reporting an outcome: {reason}")]
    TaskAborted { reason: String },
}

/// Why a single script did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptError {
    /// The process ran and exited non-zero. Termination by signal is `-1`.
    #[error("script exited with status {0}")]
    ScriptFailure(i32),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Terminal state of one script invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStatus {
    /// Blocking script exited with status 0.
    Exited,
    /// Background script was started; its exit is never observed.
    Launched,
    Failed(ScriptError),
}

/// Output captured from a blocking script (lossy UTF-8).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptOutcome {
    pub script: String,
    pub destination: Destination,
    pub status: ScriptStatus,
    pub output: Option<CapturedOutput>,
    pub elapsed: Duration,
}

impl ScriptOutcome {
    /// Outcome of a process that ran to completion with `code`.
    pub fn exited(
        script: impl Into<String>,
        destination: Destination,
        code: i32,
        output: CapturedOutput,
        elapsed: Duration,
    ) -> Self {
        let status = if code == 0 {
            ScriptStatus::Exited
        } else {
            ScriptStatus::Failed(ScriptError::ScriptFailure(code))
        };
        Self {
            script: script.into(),
            destination,
            status,
            output: Some(output),
            elapsed,
        }
    }

    pub fn launched(script: impl Into<String>, destination: Destination, elapsed: Duration) -> Self {
        Self {
            script: script.into(),
            destination,
            status: ScriptStatus::Launched,
            output: None,
            elapsed,
        }
    }

    pub fn engine_error(
        script: impl Into<String>,
        destination: Destination,
        error: EngineError,
        elapsed: Duration,
    ) -> Self {
        Self {
            script: script.into(),
            destination,
            status: ScriptStatus::Failed(ScriptError::Engine(error)),
            output: None,
            elapsed,
        }
    }

    /// `Exited` and `Launched` both count as success, so a Background step
    /// lets a serial chain continue as soon as it is started.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ScriptStatus::Exited | ScriptStatus::Launched)
    }

    pub fn error(&self) -> Option<&ScriptError> {
        match &self.status {
            ScriptStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Exit status of a process that ran to completion, if known.
    pub fn exit_code(&self) -> Option<i32> {
        match &self.status {
            ScriptStatus::Exited => Some(0),
            ScriptStatus::Failed(ScriptError::ScriptFailure(code)) => Some(*code),
            _ => None,
        }
    }

    pub fn engine_failure(&self) -> Option<&EngineError> {
        match &self.status {
            ScriptStatus::Failed(ScriptError::Engine(err)) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Script,
    Serial,
}

/// The step at which a task stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub index: usize,
    pub name: String,
    pub error: ScriptError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskFailure {
    /// A single-script task failed.
    Script { step: FailedStep },
    /// A serial chain halted at `step`; `skipped` never started.
    ChainAbort { step: FailedStep, skipped: Vec<String> },
    /// The task's execution unit died without producing an outcome.
    Aborted { error: EngineError },
}

impl TaskFailure {
    pub fn step(&self) -> Option<&FailedStep> {
        match self {
            TaskFailure::Script { step } | TaskFailure::ChainAbort { step, .. } => Some(step),
            TaskFailure::Aborted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    /// Position of the task in the job document.
    pub index: usize,
    pub name: String,
    pub kind: TaskKind,
    /// Outcomes of the steps that actually ran, in order.
    pub steps: Vec<ScriptOutcome>,
    pub failure: Option<TaskFailure>,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed_step(&self) -> Option<&FailedStep> {
        self.failure.as_ref().and_then(TaskFailure::step)
    }

    pub(crate) fn aborted(index: usize, name: String, kind: TaskKind, error: EngineError) -> Self {
        Self {
            index,
            name,
            kind,
            steps: Vec::new(),
            failure: Some(TaskFailure::Aborted { error }),
        }
    }
}

/// Final result of a job: one outcome per task, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub job: String,
    pub tasks: Vec<TaskOutcome>,
    pub success: bool,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn new(job: impl Into<String>, tasks: Vec<TaskOutcome>, elapsed: Duration) -> Self {
        let success = tasks.iter().all(TaskOutcome::is_success);
        Self {
            job: job.into(),
            tasks,
            success,
            elapsed,
        }
    }

    pub fn task(&self, index: usize) -> Option<&TaskOutcome> {
        self.tasks.get(index)
    }

    /// First task with the given display name.
    pub fn task_by_name(&self, name: &str) -> Option<&TaskOutcome> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.tasks.iter().filter(|t| !t.is_success())
    }
}
