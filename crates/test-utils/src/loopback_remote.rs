use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use jobrunner::engine::{CapturedOutput, EngineError};
use jobrunner::exec::{RemoteCompletion, RemoteRequest, RemoteShell};

/// Remote shell whose "remote host" is a local `sh -c`.
///
/// Runs the composed remote command line exactly as a login shell on the
/// far side of ssh would: command line as the `-c` argument, script body on
/// stdin. The host name is ignored.
#[derive(Debug, Clone, Default)]
pub struct LoopbackRemoteShell;

impl LoopbackRemoteShell {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteShell for LoopbackRemoteShell {
    fn execute<'a>(
        &'a self,
        host: &'a str,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteCompletion, EngineError>> + Send + 'a>> {
        Box::pin(async move {
            let transport = |detail: String| EngineError::Transport {
                host: host.to_string(),
                detail,
            };

            let mut child = Command::new("sh")
                .arg("-c")
                .arg(&request.command)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| transport(e.to_string()))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(request.stdin.as_bytes())
                    .await
                    .map_err(|e| transport(e.to_string()))?;
            }

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| transport(e.to_string()))?;

            Ok(RemoteCompletion {
                exit_code: output.status.code().unwrap_or(-1),
                output: CapturedOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                },
            })
        })
    }
}
