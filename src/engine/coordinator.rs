// src/engine/coordinator.rs

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{Job, Task};
use crate::engine::outcome::{EngineError, JobOutcome, TaskKind, TaskOutcome};
use crate::engine::task::run_task;
use crate::exec::ExecutorBackend;

/// Runs every task of a job concurrently and joins their outcomes.
///
/// Each task gets its own Tokio task. A failing task never cancels its
/// siblings; the only synchronization point is the final join, which
/// collects outcomes in document order.
pub struct JobCoordinator<B: ExecutorBackend> {
    backend: Arc<B>,
}

impl<B: ExecutorBackend> fmt::Debug for JobCoordinator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCoordinator").finish_non_exhaustive()
    }
}

impl<B: ExecutorBackend + 'static> JobCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `job` and return one outcome per task.
    ///
    /// The job succeeds iff every task succeeds.
    pub async fn run(&self, job: Job) -> JobOutcome {
        let started = Instant::now();
        info!(job = %job.name, tasks = job.tasks.len(), "job started");

        let handles: Vec<_> = job
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                let name = task.name();
                let kind = kind_of(&task);
                let backend = Arc::clone(&self.backend);
                let handle =
                    tokio::spawn(async move { run_task(backend.as_ref(), index, &task).await });
                (index, name, kind, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, name, kind, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(job = %job.name, task = %name, index, error = %e, "task did not complete");
                    TaskOutcome::aborted(
                        index,
                        name,
                        kind,
                        EngineError::TaskAborted {
                            reason: e.to_string(),
                        },
                    )
                }
            };
            outcomes.push(outcome);
        }

        let outcome = JobOutcome::new(job.name, outcomes, started.elapsed());
        info!(
            job = %outcome.job,
            success = outcome.success,
            failed = outcome.failed_tasks().count(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "job finished"
        );
        outcome
    }
}

fn kind_of(task: &Task) -> TaskKind {
    match task {
        Task::Script(_) => TaskKind::Script,
        Task::Serial(_) => TaskKind::Serial,
    }
}
