use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobrunner::config::Script;
use jobrunner::engine::{CapturedOutput, EngineError, ScriptOutcome};
use jobrunner::exec::ExecutorBackend;

/// What the fake does when asked to run a script with a given name.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Exit with this status after an optional delay.
    Exit { code: i32, delay: Duration },
    /// Report a launched Background process.
    Launch,
    /// Fail to start.
    EngineError(EngineError),
}

impl FakeBehaviour {
    pub fn exit(code: i32) -> Self {
        FakeBehaviour::Exit {
            code,
            delay: Duration::ZERO,
        }
    }

    pub fn slow_exit(code: i32, delay: Duration) -> Self {
        FakeBehaviour::Exit { code, delay }
    }
}

/// A fake executor that:
/// - records which scripts were "run", in the order they started
/// - answers each script according to its configured behaviour (default:
///   exit 0 immediately).
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    behaviours: Arc<Mutex<HashMap<String, FakeBehaviour>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the behaviour for scripts named `name`.
    pub fn on(self, name: &str, behaviour: FakeBehaviour) -> Self {
        self.behaviours
            .lock()
            .unwrap()
            .insert(name.to_string(), behaviour);
        self
    }

    /// Names of scripts run so far, in start order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn behaviour_for(&self, name: &str) -> FakeBehaviour {
        self.behaviours
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| FakeBehaviour::exit(0))
    }
}

impl ExecutorBackend for FakeExecutor {
    fn run_script<'a>(
        &'a self,
        script: &'a Script,
    ) -> Pin<Box<dyn Future<Output = ScriptOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(script.name.clone());

            let destination = script.destination.clone();
            match self.behaviour_for(&script.name) {
                FakeBehaviour::Exit { code, delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    ScriptOutcome::exited(
                        &script.name,
                        destination,
                        code,
                        CapturedOutput::default(),
                        delay,
                    )
                }
                FakeBehaviour::Launch => {
                    ScriptOutcome::launched(&script.name, destination, Duration::ZERO)
                }
                FakeBehaviour::EngineError(err) => {
                    ScriptOutcome::engine_error(&script.name, destination, err, Duration::ZERO)
                }
            }
        })
    }
}
