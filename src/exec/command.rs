// src/exec/command.rs

//! Local process execution.
//!
//! A script body is written to a temporary file and the resolved interpreter
//! is started on that file with `tokio::process::Command`, using exactly the
//! prepared environment.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempPath;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{CapturedOutput, EngineError};
use crate::exec::environment::EnvVars;
use crate::exec::registry::DetachedProcess;
use crate::exec::shell::Invocation;

/// Everything needed to start one script, independent of where it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    /// Script name, used for logging and outcomes.
    pub label: String,
    pub invocation: Invocation,
    pub body: String,
    pub env: EnvVars,
}

/// A local process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit status; `-1` when the process was terminated by a signal.
    pub code: i32,
    pub output: CapturedOutput,
}

/// Run `cmd` locally and wait for it to exit, streaming its output to the
/// log at debug level while capturing it.
///
/// The outcome is decided by the process's own exit. Descendants that keep
/// its stdout/stderr open (e.g. `sleep 60 &`) are not waited for: reading
/// stops [`OUTPUT_GRACE`] after the exit and whatever was read so far is kept.
pub async fn run_local(cmd: &PreparedCommand) -> std::result::Result<ProcessExit, EngineError> {
    let script = stage_script(&cmd.body).map_err(|e| EngineError::Staging {
        reason: format!("{e:#}"),
    })?;

    let mut command = local_command(cmd, &script);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| EngineError::SpawnFailed {
        program: cmd.invocation.program.clone(),
        reason: e.to_string(),
    })?;

    let stdout = child
        .stdout
        .take()
        .map(|s| StreamCapture::spawn(s, cmd.label.clone(), "stdout"));
    let stderr = child
        .stderr
        .take()
        .map(|s| StreamCapture::spawn(s, cmd.label.clone(), "stderr"));

    let status = child.wait().await.map_err(|e| EngineError::WaitFailed {
        program: cmd.invocation.program.clone(),
        reason: e.to_string(),
    })?;

    let output = CapturedOutput {
        stdout: StreamCapture::finish(stdout).await,
        stderr: StreamCapture::finish(stderr).await,
    };

    // Staged file is removed when `script` drops.
    drop(script);

    Ok(ProcessExit {
        code: status.code().unwrap_or(-1),
        output,
    })
}

/// Start `cmd` locally without waiting for it.
///
/// The process gets its own process group and no stdio, so it outlives the
/// engine. Its staged script file is kept until the process is reaped.
pub fn launch_detached(cmd: &PreparedCommand) -> std::result::Result<DetachedProcess, EngineError> {
    let script = stage_script(&cmd.body)
        .and_then(|p| p.keep().context("keeping staged script"))
        .map_err(|e| EngineError::Staging {
            reason: format!("{e:#}"),
        })?;

    let mut command = local_command(cmd, &script);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    command.process_group(0);

    match command.spawn() {
        Ok(child) => Ok(DetachedProcess::new(cmd.label.clone(), child, Some(script))),
        Err(e) => {
            remove_staged(&script);
            Err(EngineError::SpawnFailed {
                program: cmd.invocation.program.clone(),
                reason: e.to_string(),
            })
        }
    }
}

fn local_command(cmd: &PreparedCommand, script: &Path) -> Command {
    let mut command = Command::new(&cmd.invocation.program);
    command
        .args(&cmd.invocation.args)
        .arg(script)
        .env_clear()
        .envs(&cmd.env);
    command
}

/// Write a script body to a fresh temporary file.
fn stage_script(body: &str) -> Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("jobrunner-")
        .tempfile()
        .context("creating temporary script file")?;
    file.write_all(body.as_bytes())
        .with_context(|| format!("writing script to {:?}", file.path()))?;
    file.flush().context("flushing script file")?;
    Ok(file.into_temp_path())
}

/// How long output is still read after the process itself has exited.
pub const OUTPUT_GRACE: Duration = Duration::from_millis(250);

/// A child stream being read in the background into a shared buffer.
struct StreamCapture {
    buffer: Arc<Mutex<String>>,
    reader: JoinHandle<()>,
}

impl StreamCapture {
    fn spawn<R>(reader: R, script: String, stream: &'static str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(String::new()));
        let reader = tokio::spawn(collect_stream(reader, script, stream, Arc::clone(&buffer)));
        Self { buffer, reader }
    }

    /// Wait up to [`OUTPUT_GRACE`] for the stream to close, then return what
    /// was captured.
    async fn finish(capture: Option<Self>) -> String {
        let Some(mut capture) = capture else {
            return String::new();
        };
        if tokio::time::timeout(OUTPUT_GRACE, &mut capture.reader)
            .await
            .is_err()
        {
            debug!("stream still held open after exit; keeping partial output");
            capture.reader.abort();
        }
        let mut buffer = capture.buffer.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buffer)
    }
}

/// Read a child stream to the end, logging each line.
///
/// Lines are read as bytes so non-UTF-8 output never stops the reader (which
/// would leave the child blocked on a full pipe).
async fn collect_stream<R>(reader: R, script: String, stream: &'static str, sink: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                debug!(script = %script, stream, "{}", text.trim_end_matches(['\n', '\r']));
                sink.lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push_str(&text);
            }
            Err(e) => {
                debug!(script = %script, stream, error = %e, "stopped reading process output");
                break;
            }
        }
    }
}

/// Remove a staged script file that is no longer needed.
pub(crate) fn remove_staged(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!(path = ?path, error = %e, "could not remove staged script");
    }
}
