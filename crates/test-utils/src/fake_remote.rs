use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobrunner::engine::{CapturedOutput, EngineError};
use jobrunner::exec::{RemoteCompletion, RemoteRequest, RemoteShell};

/// How a fake host answers.
#[derive(Debug, Clone)]
pub enum FakeHost {
    /// Runs the command and exits with `code`, printing `stdout`.
    Exits {
        code: i32,
        stdout: String,
        delay: Duration,
    },
    Unreachable,
    AuthFailure,
    /// Connection drops after part of the output was received.
    DropsConnection { partial_stdout: String },
}

impl FakeHost {
    pub fn exits(code: i32) -> Self {
        FakeHost::Exits {
            code,
            stdout: String::new(),
            delay: Duration::ZERO,
        }
    }
}

/// A recorded remote call.
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub host: String,
    pub request: RemoteRequest,
}

/// Fake remote shell: never touches the network. Unknown hosts are
/// unreachable.
#[derive(Debug, Clone, Default)]
pub struct FakeRemoteShell {
    hosts: Arc<Mutex<HashMap<String, FakeHost>>>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
}

impl FakeRemoteShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(self, host: &str, behaviour: FakeHost) -> Self {
        self.hosts
            .lock()
            .unwrap()
            .insert(host.to_string(), behaviour);
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteShell for FakeRemoteShell {
    fn execute<'a>(
        &'a self,
        host: &'a str,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteCompletion, EngineError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RemoteCall {
                host: host.to_string(),
                request,
            });

            let behaviour = self
                .hosts
                .lock()
                .unwrap()
                .get(host)
                .cloned()
                .unwrap_or(FakeHost::Unreachable);

            match behaviour {
                FakeHost::Exits {
                    code,
                    stdout,
                    delay,
                } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(RemoteCompletion {
                        exit_code: code,
                        output: CapturedOutput {
                            stdout,
                            stderr: String::new(),
                        },
                    })
                }
                FakeHost::Unreachable => Err(EngineError::HostUnreachable {
                    host: host.to_string(),
                    detail: format!("ssh: Could not resolve hostname {host}"),
                }),
                FakeHost::AuthFailure => Err(EngineError::AuthFailed {
                    host: host.to_string(),
                    detail: "Permission denied (publickey).".to_string(),
                }),
                FakeHost::DropsConnection { partial_stdout } => Err(EngineError::Transport {
                    host: host.to_string(),
                    detail: format!("connection closed after output: {partial_stdout}"),
                }),
            }
        })
    }
}
