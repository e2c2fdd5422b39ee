// src/exec/script_runner.rs

//! Script runner: turns one `Script` into a prepared command and hands it to
//! the dispatcher.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::info;

use crate::config::Script;
use crate::engine::{ScriptOutcome, ScriptStatus};
use crate::exec::backend::ExecutorBackend;
use crate::exec::command::PreparedCommand;
use crate::exec::dispatcher::Dispatcher;
use crate::exec::registry::DetachedRegistry;
use crate::exec::remote::{RemoteShell, SshRemoteShell};
use crate::exec::{environment, shell};

/// Production [`ExecutorBackend`].
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    dispatcher: Dispatcher,
}

impl ScriptRunner {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Runner whose remote destinations go through `remote`.
    pub fn with_remote(remote: Arc<dyn RemoteShell>) -> Self {
        Self::new(Dispatcher::new(remote))
    }

    /// Runner using the system `ssh` client with default settings.
    pub fn with_default_ssh() -> Self {
        Self::with_remote(Arc::new(SshRemoteShell::default()))
    }

    pub fn registry(&self) -> &Arc<DetachedRegistry> {
        self.dispatcher.registry()
    }

    /// Resolve shell and environment for `script`.
    pub fn prepare(script: &Script) -> PreparedCommand {
        PreparedCommand {
            label: script.name.clone(),
            invocation: shell::resolve(&script.shell),
            body: script.script.clone(),
            env: environment::build(script.environment),
        }
    }

    /// Run `script`. Blocking scripts return once the process has exited;
    /// Background scripts return as soon as the process is launched.
    pub async fn run(&self, script: &Script) -> ScriptOutcome {
        let command = Self::prepare(script);
        info!(
            script = %script.name,
            destination = %script.destination,
            shell = %command.invocation,
            execution = ?script.execution,
            "starting script"
        );

        let outcome = self
            .dispatcher
            .execute(&command, &script.destination, script.execution.is_blocking())
            .await;

        match &outcome.status {
            ScriptStatus::Exited | ScriptStatus::Launched => info!(
                script = %script.name,
                status = ?outcome.status,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "script finished"
            ),
            ScriptStatus::Failed(err) => info!(
                script = %script.name,
                error = %err,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "script failed"
            ),
        }

        outcome
    }
}

impl ExecutorBackend for ScriptRunner {
    fn run_script<'a>(
        &'a self,
        script: &'a Script,
    ) -> Pin<Box<dyn Future<Output = ScriptOutcome> + Send + 'a>> {
        Box::pin(self.run(script))
    }
}
