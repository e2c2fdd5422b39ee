// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running scripts, locally with
//! `tokio::process::Command` or on a remote host through a [`RemoteShell`].
//!
//! - [`shell`] resolves a `Shell` to an interpreter invocation.
//! - [`environment`] builds the variable set a script receives.
//! - [`command`] stages script bodies and runs local processes.
//! - [`remote`] holds the remote-shell capability and its `openssh` implementation.
//! - [`dispatcher`] routes a prepared command to its destination.
//! - [`registry`] remembers detached Background processes.
//! - [`script_runner`] ties the above together per script.
//! - [`backend`] provides the `ExecutorBackend` trait that the engine talks
//!   to, and which tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod dispatcher;
pub mod environment;
pub mod registry;
pub mod remote;
pub mod script_runner;
pub mod shell;

pub use backend::ExecutorBackend;
pub use command::PreparedCommand;
pub use dispatcher::Dispatcher;
pub use environment::EnvVars;
pub use registry::DetachedRegistry;
pub use remote::{HostKeyCheck, RemoteCompletion, RemoteRequest, RemoteShell, SshRemoteShell};
pub use script_runner::ScriptRunner;
pub use shell::Invocation;
