// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, ReportFormat};
use crate::config::loader::load_and_validate;
use crate::config::{Destination, Environment, Execution, Job, Script, Shell, Task};
use crate::engine::JobCoordinator;
use crate::exec::{ScriptRunner, SshRemoteShell};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job document loading and validation
/// - the openssh remote shell and script runner
/// - the job coordinator
/// - report rendering
///
/// Returns whether the job succeeded. An `Err` means nothing ran (bad
/// document, unreadable file) or the report could not be written.
pub async fn run(args: CliArgs) -> Result<bool> {
    if args.print_schema {
        println!("{}", serde_json::to_string_pretty(&config::job_schema())?);
        return Ok(true);
    }

    if args.print_example {
        println!("{}", serde_json::to_string_pretty(&example_job())?);
        return Ok(true);
    }

    let job = load_and_validate(&args.job)
        .with_context(|| format!("loading job document {:?}", args.job))?;

    if args.dry_run {
        print!("{}", report::render_plan(&job));
        debug!("dry-run complete (no execution)");
        return Ok(true);
    }

    let ssh = SshRemoteShell::new(
        Duration::from_secs(args.connect_timeout),
        args.known_hosts.into(),
    );
    let runner = ScriptRunner::with_remote(Arc::new(ssh));
    let registry = Arc::clone(runner.registry());

    let coordinator = JobCoordinator::new(runner);
    let outcome = coordinator.run(job).await;

    match args.format {
        ReportFormat::Text => print!("{}", report::render_text(&outcome)),
        ReportFormat::Json => println!("{}", report::render_json(&outcome)?),
    }

    let reaped = registry.reap();
    let running = registry.running();
    if reaped > 0 || running > 0 {
        info!(
            reaped,
            running,
            pids = ?registry.pids(),
            "background processes are not waited on"
        );
    }

    Ok(outcome.success)
}

/// A small job showing every kind of task, printed by `--print-example`.
pub fn example_job() -> Job {
    let script = |name: &str, body: &str, destination: Destination| Script {
        name: name.to_string(),
        script: body.to_string(),
        shell: Shell::Bash,
        destination,
        environment: Environment::None,
        execution: Execution::Blocking,
    };
    let remote = || Destination::Remote("user@build-host".to_string());

    Job::new_unchecked(
        "example",
        vec![
            Task::Script(script("local: bash_version", "bash --version", Destination::Local)),
            Task::Script(script("remote: bash_version", "bash --version", remote())),
            Task::Serial(vec![
                script("write", "date >> /tmp/date.tmp", remote()),
                script("read", "cat /tmp/date.tmp", remote()),
            ]),
            Task::Script(Script {
                environment: Environment::Current,
                execution: Execution::Background,
                ..script("background: sleep", "sleep 30", Destination::Local)
            }),
        ],
    )
}
