// src/exec/dispatcher.rs

//! Destination dispatch: run a prepared command locally or on a remote host
//! and normalize the result into a [`ScriptOutcome`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::Destination;
use crate::engine::{EngineError, ScriptOutcome};
use crate::exec::command::{self, PreparedCommand};
use crate::exec::registry::DetachedRegistry;
use crate::exec::remote::{self, RemoteShell};

/// Starts one process per call. Holds no per-call state, so a single
/// dispatcher is shared by every task of a job.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    remote: Arc<dyn RemoteShell>,
    registry: Arc<DetachedRegistry>,
}

impl Dispatcher {
    pub fn new(remote: Arc<dyn RemoteShell>) -> Self {
        Self::with_registry(remote, Arc::new(DetachedRegistry::new()))
    }

    pub fn with_registry(remote: Arc<dyn RemoteShell>, registry: Arc<DetachedRegistry>) -> Self {
        Self { remote, registry }
    }

    /// Registry of locally launched Background processes.
    pub fn registry(&self) -> &Arc<DetachedRegistry> {
        &self.registry
    }

    /// Run `command` at `destination`.
    ///
    /// With `blocking` the outcome reflects the process's exit; without it
    /// the outcome is `Launched` as soon as the process has started.
    pub async fn execute(
        &self,
        command: &PreparedCommand,
        destination: &Destination,
        blocking: bool,
    ) -> ScriptOutcome {
        let started = Instant::now();
        match destination {
            Destination::Local if blocking => match command::run_local(command).await {
                Ok(exit) => ScriptOutcome::exited(
                    &command.label,
                    destination.clone(),
                    exit.code,
                    exit.output,
                    started.elapsed(),
                ),
                Err(err) => self.failed_to_start(command, destination, err, started),
            },
            Destination::Local => match command::launch_detached(command) {
                Ok(process) => {
                    info!(script = %command.label, pid = ?process.pid, "launched detached process");
                    self.registry.record(process);
                    ScriptOutcome::launched(&command.label, destination.clone(), started.elapsed())
                }
                Err(err) => self.failed_to_start(command, destination, err, started),
            },
            Destination::Remote(host) => self.execute_remote(command, host, blocking, started).await,
        }
    }

    async fn execute_remote(
        &self,
        command: &PreparedCommand,
        host: &str,
        blocking: bool,
        started: Instant,
    ) -> ScriptOutcome {
        let destination = Destination::Remote(host.to_string());
        let request = remote::remote_request(command, !blocking);

        match self.remote.execute(host, request).await {
            Ok(done) if blocking => ScriptOutcome::exited(
                &command.label,
                destination,
                done.exit_code,
                done.output,
                started.elapsed(),
            ),
            Ok(done) if done.exit_code == 0 => {
                info!(script = %command.label, host, "launched detached remote process");
                ScriptOutcome::launched(&command.label, destination, started.elapsed())
            }
            // The launcher itself failed, so nothing was detached.
            Ok(done) => {
                let err = EngineError::SpawnFailed {
                    program: command.invocation.to_string(),
                    reason: format!(
                        "remote launch on '{host}' exited with status {}: {}",
                        done.exit_code,
                        done.output.stderr.trim()
                    ),
                };
                self.failed_to_start(command, &destination, err, started)
            }
            Err(err) => self.failed_to_start(command, &destination, err, started),
        }
    }

    fn failed_to_start(
        &self,
        command: &PreparedCommand,
        destination: &Destination,
        err: EngineError,
        started: Instant,
    ) -> ScriptOutcome {
        warn!(
            script = %command.label,
            destination = %destination,
            error = %err,
            "script could not be started"
        );
        ScriptOutcome::engine_error(&command.label, destination.clone(), err, started.elapsed())
    }
}
