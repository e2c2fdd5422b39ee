// src/config/validate.rs

use tracing::warn;

use crate::config::model::{Destination, Job, RawJob, Script, Shell, Task};
use crate::errors::{JobrunnerError, Result};

impl TryFrom<RawJob> for Job {
    type Error = crate::errors::JobrunnerError;

    fn try_from(raw: RawJob) -> std::result::Result<Self, Self::Error> {
        validate_raw_job(&raw)?;
        Ok(Job::new_unchecked(raw.name, raw.tasks))
    }
}

fn validate_raw_job(job: &RawJob) -> Result<()> {
    ensure_job_name(job)?;

    if job.tasks.is_empty() {
        warn!(job = %job.name, "job has no tasks; it will succeed without running anything");
    }

    for (index, task) in job.tasks.iter().enumerate() {
        validate_task(index, task)?;
    }
    Ok(())
}

fn ensure_job_name(job: &RawJob) -> Result<()> {
    if job.name.trim().is_empty() {
        return Err(JobrunnerError::ConfigError(
            "job `name` must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_task(index: usize, task: &Task) -> Result<()> {
    match task {
        Task::Script(script) => validate_script(index, None, script),
        Task::Serial(steps) => {
            for (step, script) in steps.iter().enumerate() {
                validate_script(index, Some(step), script)?;
            }
            Ok(())
        }
    }
}

fn validate_script(task: usize, step: Option<usize>, script: &Script) -> Result<()> {
    let location = match step {
        Some(step) => format!("task #{task}, step #{step}"),
        None => format!("task #{task}"),
    };

    if script.name.trim().is_empty() {
        return Err(JobrunnerError::ConfigError(format!(
            "{location}: script `name` must not be empty"
        )));
    }

    if let Shell::Custom(cmd) = &script.shell {
        if cmd.trim().is_empty() {
            return Err(JobrunnerError::ConfigError(format!(
                "{location} ('{}'): custom shell must name an interpreter",
                script.name
            )));
        }
    }

    if let Destination::Remote(host) = &script.destination {
        let host = host.trim();
        if host.is_empty() {
            return Err(JobrunnerError::ConfigError(format!(
                "{location} ('{}'): remote destination must name a host",
                script.name
            )));
        }
        // Would be parsed as an option by ssh.
        if host.starts_with('-') {
            return Err(JobrunnerError::ConfigError(format!(
                "{location} ('{}'): invalid remote host '{host}'",
                script.name
            )));
        }
    }

    Ok(())
}
