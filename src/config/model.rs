// src/config/model.rs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A job document as read from disk, before validation.
///
/// ```toml
/// name = "build"
///
/// [[tasks]]
/// [tasks.Script]
/// name = "compile"
/// script = "make"
/// shell = "Bash"
/// destination = "Local"
/// environment = "Current"
/// execution = "Blocking"
///
/// [[tasks]]
/// [[tasks.Serial]]
/// name = "lint"
/// script = "npm run lint"
/// shell = { Custom = "sh" }
/// destination = { Remote = "ci@builder" }
/// environment = "None"
/// execution = "Blocking"
/// ```
///
/// Unknown keys are rejected; every `Script` key is mandatory.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename = "Job", deny_unknown_fields)]
pub struct RawJob {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// A validated job: a name plus the tasks to run concurrently.
///
/// Task order carries no execution meaning; it is only the order in which
/// outcomes are reported.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub tasks: Vec<Task>,
}

impl Job {
    /// Build a job without running validation. Used by builders and tests;
    /// documents read from disk go through `Job::try_from(RawJob)`.
    pub fn new_unchecked(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }
}

/// One unit of concurrent work inside a job.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Task {
    /// A single script.
    Script(Script),
    /// Scripts run one after another, stopping at the first failure.
    Serial(Vec<Script>),
}

impl Task {
    /// Display name used in logs and reports.
    ///
    /// Serial chains are named after their steps, joined with `=>`.
    pub fn name(&self) -> String {
        match self {
            Task::Script(s) => s.name.clone(),
            Task::Serial(steps) if steps.is_empty() => "(empty serial)".to_string(),
            Task::Serial(steps) => steps
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(" => "),
        }
    }

    /// Scripts of this task in execution order.
    pub fn scripts(&self) -> &[Script] {
        match self {
            Task::Script(s) => std::slice::from_ref(s),
            Task::Serial(steps) => steps,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub name: String,
    /// The script body handed to the interpreter.
    pub script: String,
    pub shell: Shell,
    pub destination: Destination,
    pub environment: Environment,
    pub execution: Execution,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Shell {
    Bash,
    /// Interpreter command line, e.g. `"python3 -u"`.
    Custom(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Destination {
    /// Run on the machine making the call
    Local,
    /// Run on a remote machine via ssh
    Remote(String),
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Local => write!(f, "local"),
            Destination::Remote(host) => write!(f, "remote:{host}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Environment {
    /// Clear out all env variables
    None,
    /// Use the current env variables
    Current,
}

/// Whether the caller waits for the script's process.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Execution {
    Blocking,
    /// Spawn and return as soon as the process is launched. The exit of the
    /// process is never observed.
    Background,
}

impl Execution {
    pub fn is_blocking(self) -> bool {
        matches!(self, Execution::Blocking)
    }
}
