// src/report.rs

//! Human and machine readable renderings of plans and outcomes.

use std::fmt::Write;

use crate::config::{Job, Script, Shell, Task};
use crate::engine::{JobOutcome, ScriptStatus, TaskFailure, TaskOutcome};
use crate::errors::Result;

/// Describe what `job` would run, without running it.
pub fn render_plan(job: &Job) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "jobrunner dry-run");
    let _ = writeln!(out, "  job = {}", job.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "tasks ({}), all started concurrently:", job.tasks.len());

    for (index, task) in job.tasks.iter().enumerate() {
        match task {
            Task::Script(script) => {
                let _ = writeln!(out, "  [{index}] script");
                write_script(&mut out, script, "      ");
            }
            Task::Serial(steps) => {
                let _ = writeln!(out, "  [{index}] serial ({} steps)", steps.len());
                for (step, script) in steps.iter().enumerate() {
                    let _ = writeln!(out, "      {}.", step + 1);
                    write_script(&mut out, script, "        ");
                }
            }
        }
    }
    out
}

fn write_script(out: &mut String, script: &Script, indent: &str) {
    let shell = match &script.shell {
        Shell::Bash => "bash".to_string(),
        Shell::Custom(cmd) => format!("custom `{cmd}`"),
    };
    let _ = writeln!(out, "{indent}name: {}", script.name);
    let _ = writeln!(out, "{indent}shell: {shell}");
    let _ = writeln!(out, "{indent}destination: {}", script.destination);
    let _ = writeln!(out, "{indent}environment: {:?}", script.environment);
    let _ = writeln!(out, "{indent}execution: {:?}", script.execution);
    for line in script.script.lines() {
        let _ = writeln!(out, "{indent}| {line}");
    }
}

/// Plain-text report of a finished job.
pub fn render_text(outcome: &JobOutcome) -> String {
    let mut out = String::new();
    let verdict = if outcome.success { "SUCCEEDED" } else { "FAILED" };
    let _ = writeln!(
        out,
        "job '{}' {verdict} ({} tasks, {} failed, {:.2}s)",
        outcome.job,
        outcome.tasks.len(),
        outcome.failed_tasks().count(),
        outcome.elapsed.as_secs_f64()
    );

    for task in &outcome.tasks {
        write_task(&mut out, task);
    }
    out
}

fn write_task(out: &mut String, task: &TaskOutcome) {
    let mark = if task.is_success() { "ok  " } else { "FAIL" };
    let _ = writeln!(out, "  {mark} [{}] {}", task.index, task.name);

    for step in &task.steps {
        let status = match &step.status {
            ScriptStatus::Exited => "exited 0".to_string(),
            ScriptStatus::Launched => "launched in background".to_string(),
            ScriptStatus::Failed(err) => err.to_string(),
        };
        let _ = writeln!(
            out,
            "         - {} @ {}: {status} ({:.2}s)",
            step.script,
            step.destination,
            step.elapsed.as_secs_f64()
        );
    }

    match &task.failure {
        None => {}
        Some(TaskFailure::Script { step }) => {
            let _ = writeln!(out, "         failed at '{}': {}", step.name, step.error);
        }
        Some(TaskFailure::ChainAbort { step, skipped }) => {
            let _ = writeln!(
                out,
                "         chain aborted at step {} '{}': {}",
                step.index + 1,
                step.name,
                step.error
            );
            if !skipped.is_empty() {
                let _ = writeln!(out, "         not started: {}", skipped.join(", "));
            }
        }
        Some(TaskFailure::Aborted { error }) => {
            let _ = writeln!(out, "         {error}");
        }
    }
}

/// JSON report of a finished job.
pub fn render_json(outcome: &JobOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
