// src/exec/remote.rs

//! Remote-shell capability.
//!
//! The engine sees remote hosts only through [`RemoteShell`]: "run this
//! command line on host H with this stdin, return the exit status and
//! output". [`SshRemoteShell`] runs it over an `openssh` session; tests
//! provide their own implementation.
//!
//! The command line itself is composed here by [`remote_command_line`]: the
//! script body travels over stdin, is staged in a `mktemp` file on the
//! remote side, and is run by the interpreter under `env -i` with the
//! prepared variables.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use openssh::{KnownHosts, Session, SessionBuilder, Stdio};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::engine::{CapturedOutput, EngineError};
use crate::exec::command::PreparedCommand;

/// What to run on a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Script name, for logging.
    pub label: String,
    /// Command line executed by the remote login shell.
    pub command: String,
    /// Bytes written to the remote command's stdin.
    pub stdin: String,
    /// The command line returns as soon as the script is launched.
    pub detach: bool,
}

/// A remote command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCompletion {
    pub exit_code: i32,
    pub output: CapturedOutput,
}

/// Opaque remote execution capability.
///
/// Implementations must be usable concurrently by several tasks, including
/// tasks targeting the same host. Transport problems (unreachable host,
/// authentication, dropped connection) are returned as `Err`; a command that
/// ran and exited non-zero is an `Ok` with that exit code.
pub trait RemoteShell: Send + Sync + fmt::Debug {
    fn execute<'a>(
        &'a self,
        host: &'a str,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteCompletion, EngineError>> + Send + 'a>>;
}

/// Build the request that runs `cmd` on a remote host.
pub fn remote_request(cmd: &PreparedCommand, detach: bool) -> RemoteRequest {
    RemoteRequest {
        label: cmd.label.clone(),
        command: remote_command_line(cmd, detach),
        stdin: cmd.body.clone(),
        detach,
    }
}

/// Compose the remote command line for `cmd`.
///
/// Blocking:
/// `f=$(mktemp) && cat > "$f" && { env -i 'K=V' 'bash' "$f"; s=$?; rm -f "$f"; exit $s; }`
///
/// Detached, the interpreter runs in a background subshell that ignores
/// SIGHUP and removes the staged file when it finishes.
pub fn remote_command_line(cmd: &PreparedCommand, detach: bool) -> String {
    let mut run = String::from("env -i");
    for (key, value) in &cmd.env {
        if !is_env_name(key) {
            continue;
        }
        run.push(' ');
        run.push_str(&shell_quote(&format!("{key}={value}")));
    }
    run.push(' ');
    run.push_str(&shell_quote(&cmd.invocation.program));
    for arg in &cmd.invocation.args {
        run.push(' ');
        run.push_str(&shell_quote(arg));
    }
    run.push_str(" \"$f\"");

    if detach {
        format!(
            "f=$(mktemp) && cat > \"$f\" && {{ ( trap '' HUP; {run}; rm -f \"$f\" ) >/dev/null 2>&1 </dev/null & }}"
        )
    } else {
        format!("f=$(mktemp) && cat > \"$f\" && {{ {run}; s=$?; rm -f \"$f\"; exit $s; }}")
    }
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Host key policy for new ssh sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyCheck {
    /// Only hosts already in `known_hosts` are accepted.
    Strict,
    /// Unknown hosts are added; changed keys are refused.
    Add,
    /// Any host key is accepted.
    Accept,
}

impl HostKeyCheck {
    fn known_hosts(self) -> KnownHosts {
        match self {
            HostKeyCheck::Strict => KnownHosts::Strict,
            HostKeyCheck::Add => KnownHosts::Add,
            HostKeyCheck::Accept => KnownHosts::Accept,
        }
    }
}

/// [`RemoteShell`] backed by `openssh`.
///
/// Each call opens its own multiplexed session and closes it afterwards, so
/// concurrent calls never wait on each other, even for the same host.
#[derive(Debug, Clone)]
pub struct SshRemoteShell {
    connect_timeout: Duration,
    host_keys: HostKeyCheck,
    control_dir: PathBuf,
}

impl Default for SshRemoteShell {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), HostKeyCheck::Strict)
    }
}

impl SshRemoteShell {
    pub fn new(connect_timeout: Duration, host_keys: HostKeyCheck) -> Self {
        Self {
            connect_timeout,
            host_keys,
            control_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the session control sockets (default: the system temp
    /// directory).
    pub fn with_control_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.control_dir = dir.into();
        self
    }

    async fn connect(&self, host: &str) -> Result<Session, EngineError> {
        let mut builder = SessionBuilder::default();
        builder
            .known_hosts_check(self.host_keys.known_hosts())
            .connect_timeout(self.connect_timeout)
            .control_directory(&self.control_dir);

        builder
            .connect_mux(host)
            .await
            .map_err(|e| classify_session_error(host, &e))
    }

    async fn run(&self, host: &str, request: RemoteRequest) -> Result<RemoteCompletion, EngineError> {
        debug!(host, script = %request.label, command = %request.command, "opening ssh session");

        let session = self.connect(host).await?;
        let result = run_in_session(&session, host, &request).await;

        if let Err(e) = session.close().await {
            debug!(host, script = %request.label, error = %e, "ssh session did not close cleanly");
        }
        result
    }
}

async fn run_in_session(
    session: &Session,
    host: &str,
    request: &RemoteRequest,
) -> Result<RemoteCompletion, EngineError> {
    let mut command = session.raw_command(&request.command);
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .await
        .map_err(|e| classify_session_error(host, &e))?;

    // The remote side reads the whole body before it produces any output.
    if let Some(mut stdin) = child.stdin().take() {
        if let Err(e) = stdin.write_all(request.stdin.as_bytes()).await {
            warn!(host, script = %request.label, error = %e, "could not send script to remote host");
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| classify_session_error(host, &e))?;

    let output_text = CapturedOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    for (stream, text) in [("stdout", &output_text.stdout), ("stderr", &output_text.stderr)] {
        for line in text.lines() {
            debug!(host, script = %request.label, stream, "{line}");
        }
    }

    Ok(RemoteCompletion {
        exit_code: output.status.code().unwrap_or(-1),
        output: output_text,
    })
}

impl RemoteShell for SshRemoteShell {
    fn execute<'a>(
        &'a self,
        host: &'a str,
        request: RemoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteCompletion, EngineError>> + Send + 'a>> {
        Box::pin(self.run(host, request))
    }
}

/// Map an `openssh` session error to the engine's transport error kinds.
///
/// Failing to establish the session is `AuthFailed` when ssh refused our
/// credentials and `HostUnreachable` otherwise. Anything that goes wrong once
/// the session is up is `Transport`.
pub fn classify_session_error(host: &str, err: &openssh::Error) -> EngineError {
    let host = host.to_string();
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    match err {
        openssh::Error::Connect(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            EngineError::AuthFailed { host, detail }
        }
        openssh::Error::Connect(_) => EngineError::HostUnreachable { host, detail },
        _ => EngineError::Transport { host, detail },
    }
}
