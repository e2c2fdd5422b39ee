// src/engine/task.rs

//! Task executor.
//!
//! A `Script` task is one backend call. A `Serial` task walks its steps in
//! order and stops at the first failure; steps after it are never started.
//! Nothing is retried.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::{Script, Task};
use crate::engine::outcome::{FailedStep, TaskFailure, TaskKind, TaskOutcome};
use crate::exec::ExecutorBackend;

/// Lifecycle of one task, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    /// Running the step with this index.
    Running(usize),
    Succeeded,
    Failed(usize),
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Running(step) => write!(f, "running(step {step})"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed(step) => write!(f, "failed(step {step})"),
        }
    }
}

/// Run `task` (at position `index` in its job) to a terminal outcome.
pub async fn run_task<B>(backend: &B, index: usize, task: &Task) -> TaskOutcome
where
    B: ExecutorBackend + ?Sized,
{
    let name = task.name();
    match task {
        Task::Script(script) => run_single(backend, index, name, script).await,
        Task::Serial(steps) => run_serial(backend, index, name, steps).await,
    }
}

async fn run_single<B>(backend: &B, index: usize, name: String, script: &Script) -> TaskOutcome
where
    B: ExecutorBackend + ?Sized,
{
    transition(index, &name, TaskState::Pending, TaskState::Running(0));
    let outcome = backend.run_script(script).await;

    let failure = outcome.error().map(|err| TaskFailure::Script {
        step: FailedStep {
            index: 0,
            name: script.name.clone(),
            error: err.clone(),
        },
    });

    let end = if failure.is_some() {
        TaskState::Failed(0)
    } else {
        TaskState::Succeeded
    };
    transition(index, &name, TaskState::Running(0), end);

    TaskOutcome {
        index,
        name,
        kind: TaskKind::Script,
        steps: vec![outcome],
        failure,
    }
}

async fn run_serial<B>(backend: &B, index: usize, name: String, steps: &[Script]) -> TaskOutcome
where
    B: ExecutorBackend + ?Sized,
{
    let mut state = TaskState::Pending;
    let mut outcomes = Vec::with_capacity(steps.len());
    let mut failure = None;

    for (step, script) in steps.iter().enumerate() {
        transition(index, &name, state, TaskState::Running(step));
        state = TaskState::Running(step);

        let outcome = backend.run_script(script).await;
        let error = outcome.error().cloned();
        outcomes.push(outcome);

        if let Some(error) = error {
            let skipped: Vec<String> = steps[step + 1..].iter().map(|s| s.name.clone()).collect();
            warn!(
                task = %name,
                step,
                script = %script.name,
                error = %error,
                skipped = skipped.len(),
                "serial chain aborted"
            );
            failure = Some(TaskFailure::ChainAbort {
                step: FailedStep {
                    index: step,
                    name: script.name.clone(),
                    error,
                },
                skipped,
            });
            transition(index, &name, state, TaskState::Failed(step));
            break;
        }
    }

    if failure.is_none() {
        transition(index, &name, state, TaskState::Succeeded);
    }

    TaskOutcome {
        index,
        name,
        kind: TaskKind::Serial,
        steps: outcomes,
        failure,
    }
}

fn transition(index: usize, name: &str, from: TaskState, to: TaskState) {
    match to {
        TaskState::Succeeded | TaskState::Failed(_) => {
            info!(task = %name, index, from = %from, to = %to, "task finished")
        }
        _ => debug!(task = %name, index, from = %from, to = %to, "task state change"),
    }
}
