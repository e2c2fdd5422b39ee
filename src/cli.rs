// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::exec::HostKeyCheck;

/// Command-line arguments for `jobrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobrunner",
    version,
    about = "Run the tasks of a job concurrently, locally or over ssh.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job document (TOML, or JSON with a `.json` extension).
    #[arg(long, value_name = "PATH", default_value = "Job.toml")]
    pub job: PathBuf,

    /// Parse + validate and print the plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print an example job document (JSON) and exit.
    #[arg(long)]
    pub print_example: bool,

    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Print the JSON Schema of the job document and exit.
    #[arg(long)]
    pub print_schema: bool,

    /// Host key policy for remote destinations.
    #[arg(long, value_enum, value_name = "POLICY", default_value_t = KnownHostsPolicy::Strict)]
    pub known_hosts: KnownHostsPolicy,

    /// Seconds to wait for an ssh connection before giving up.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub connect_timeout: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum KnownHostsPolicy {
    /// Only hosts already in `known_hosts`.
    Strict,
    /// Add unknown hosts, refuse changed keys.
    Add,
    /// Accept any host key.
    Accept,
}

impl From<KnownHostsPolicy> for HostKeyCheck {
    fn from(policy: KnownHostsPolicy) -> Self {
        match policy {
            KnownHostsPolicy::Strict => HostKeyCheck::Strict,
            KnownHostsPolicy::Add => HostKeyCheck::Add,
            KnownHostsPolicy::Accept => HostKeyCheck::Accept,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
