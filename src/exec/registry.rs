// src/exec/registry.rs

//! Best-effort bookkeeping for Background processes.
//!
//! The engine never waits on detached processes. The registry only remembers
//! them so a caller can later reap the ones that have finished and clean up
//! their staged script files.

use std::path::PathBuf;
use std::sync::Mutex;

use tokio::process::Child;
use tracing::{debug, warn};

use crate::exec::command::remove_staged;

/// A locally launched Background process.
#[derive(Debug)]
pub struct DetachedProcess {
    pub script: String,
    pub pid: Option<u32>,
    child: Child,
    script_path: Option<PathBuf>,
}

impl DetachedProcess {
    pub fn new(script: String, child: Child, script_path: Option<PathBuf>) -> Self {
        Self {
            script,
            pid: child.id(),
            child,
            script_path,
        }
    }
}

#[derive(Debug, Default)]
pub struct DetachedRegistry {
    entries: Mutex<Vec<DetachedProcess>>,
}

impl DetachedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, process: DetachedProcess) {
        debug!(script = %process.script, pid = ?process.pid, "recording detached process");
        self.lock().push(process);
    }

    /// Number of recorded processes not yet reaped.
    pub fn running(&self) -> usize {
        self.lock().len()
    }

    pub fn pids(&self) -> Vec<u32> {
        self.lock().iter().filter_map(|p| p.pid).collect()
    }

    /// Drop every process that has exited, removing its staged script.
    /// Returns how many were reaped. Never blocks on a running process.
    pub fn reap(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();

        entries.retain_mut(|process| match process.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(
                    script = %process.script,
                    pid = ?process.pid,
                    exit_code = ?status.code(),
                    "reaped detached process"
                );
                if let Some(path) = process.script_path.take() {
                    remove_staged(&path);
                }
                false
            }
            Err(e) => {
                warn!(
                    script = %process.script,
                    pid = ?process.pid,
                    error = %e,
                    "cannot poll detached process; forgetting it"
                );
                false
            }
        });

        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DetachedProcess>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
