// tests/local_execution.rs
//
// These tests start real `bash`/`sh` processes on the local machine.

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jobrunner::engine::{EngineError, JobCoordinator, ScriptError, ScriptStatus, TaskFailure};
use jobrunner::exec::{ScriptRunner, environment};
use jobrunner_test_utils::builders::{JobBuilder, ScriptBuilder, script};
use jobrunner_test_utils::fake_remote::FakeRemoteShell;
use jobrunner_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn local_runner() -> ScriptRunner {
    ScriptRunner::with_remote(Arc::new(FakeRemoteShell::new()))
}

#[tokio::test]
async fn exit_status_is_reported() {
    init_tracing();

    let outcome = with_timeout(local_runner().run(&script("fail", "exit 3"))).await;

    assert_eq!(
        outcome.status,
        ScriptStatus::Failed(ScriptError::ScriptFailure(3))
    );
    assert_eq!(outcome.exit_code(), Some(3));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn output_is_captured() -> TestResult {
    init_tracing();

    let outcome = with_timeout(
        local_runner().run(&script("hello", "echo hello\necho oops >&2\necho world")),
    )
    .await;

    assert_eq!(outcome.status, ScriptStatus::Exited);
    let output = outcome.output.ok_or("blocking script should capture output")?;
    assert_eq!(output.stdout, "hello\nworld\n");
    assert_eq!(output.stderr, "oops\n");
    Ok(())
}

#[tokio::test]
async fn multi_line_bodies_run_as_one_script() -> TestResult {
    init_tracing();

    let body = "set -e\nx=1\nif [ \"$x\" = 1 ]; then\n  echo branch\nfi\nfalse\necho unreachable";
    let outcome = with_timeout(local_runner().run(&script("multi", body))).await;

    assert_eq!(outcome.exit_code(), Some(1));
    let output = outcome.output.ok_or("missing output")?;
    assert_eq!(output.stdout, "branch\n");
    Ok(())
}

#[tokio::test]
async fn empty_environment_passes_no_variables() -> TestResult {
    init_tracing();

    let outcome = with_timeout(local_runner().run(&script("env", "env"))).await;

    assert_eq!(outcome.status, ScriptStatus::Exited);
    let output = outcome.output.ok_or("missing output")?;
    // bash itself exports a few variables even when started with none.
    let allowed: BTreeSet<&str> = ["PATH", "PWD", "SHLVL", "_", "OLDPWD"].into_iter().collect();
    for line in output.stdout.lines() {
        let key = line.split('=').next().unwrap_or_default();
        assert!(allowed.contains(key), "unexpected variable in child: {line}");
    }
    Ok(())
}

#[tokio::test]
async fn current_environment_is_inherited() -> TestResult {
    init_tracing();

    let snapshot = environment::build(jobrunner::config::Environment::Current);
    let s = ScriptBuilder::new("env", "env").inherit_env().build();
    let outcome = with_timeout(local_runner().run(&s)).await;

    assert_eq!(outcome.status, ScriptStatus::Exited);
    let stdout = outcome.output.ok_or("missing output")?.stdout;
    let seen: BTreeSet<&str> = stdout
        .lines()
        .filter_map(|line| line.split_once('=').map(|(k, _)| k))
        .collect();

    let shell_managed = ["PWD", "OLDPWD", "SHLVL", "_"];
    for key in snapshot.keys() {
        let plain = key.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
            && !key.starts_with(|c: char| c.is_ascii_digit());
        if !plain || shell_managed.contains(&key.as_str()) {
            continue;
        }
        assert!(seen.contains(key.as_str()), "{key} was not passed to the script");
    }
    Ok(())
}

#[tokio::test]
async fn custom_shell_runs_the_body() -> TestResult {
    init_tracing();

    let s = ScriptBuilder::new("posix", "echo $((1 + 2))")
        .custom_shell("sh")
        .build();
    let outcome = with_timeout(local_runner().run(&s)).await;

    assert_eq!(outcome.status, ScriptStatus::Exited);
    assert_eq!(outcome.output.ok_or("missing output")?.stdout, "3\n");
    Ok(())
}

#[tokio::test]
async fn custom_shell_arguments_come_before_the_script() -> TestResult {
    init_tracing();

    // With -e the script stops at `false`.
    let s = ScriptBuilder::new("strict", "false\necho after")
        .custom_shell("sh -e")
        .build();
    let outcome = with_timeout(local_runner().run(&s)).await;

    assert_eq!(outcome.exit_code(), Some(1));
    assert_eq!(outcome.output.ok_or("missing output")?.stdout, "");
    Ok(())
}

#[tokio::test]
async fn missing_interpreter_is_an_engine_error() {
    init_tracing();

    let s = ScriptBuilder::new("ghost", "echo hi")
        .custom_shell("/definitely/not/an/interpreter")
        .build();
    let outcome = with_timeout(local_runner().run(&s)).await;

    match outcome.engine_failure() {
        Some(EngineError::SpawnFailed { program, .. }) => {
            assert_eq!(program, "/definitely/not/an/interpreter");
        }
        other => panic!("expected SpawnFailed, got {other:?}"),
    }
    assert_eq!(outcome.exit_code(), None);
}

#[tokio::test]
async fn background_script_returns_once_launched() {
    init_tracing();

    let runner = local_runner();
    let s = ScriptBuilder::new("sleeper", "sleep 5").background().build();

    let started = Instant::now();
    let outcome = with_timeout(runner.run(&s)).await;

    assert_eq!(outcome.status, ScriptStatus::Launched);
    assert!(outcome.output.is_none());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(runner.registry().running(), 1);
    assert_eq!(runner.registry().pids().len(), 1);
}

#[tokio::test]
async fn finished_background_processes_are_reaped() {
    init_tracing();

    let runner = local_runner();
    let s = ScriptBuilder::new("quick", "exit 0").background().build();

    let outcome = with_timeout(runner.run(&s)).await;
    assert_eq!(outcome.status, ScriptStatus::Launched);

    let registry = Arc::clone(runner.registry());
    let reaped = with_timeout(async move {
        loop {
            if registry.reap() == 1 {
                return registry.running();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert_eq!(reaped, 0);
}

#[tokio::test]
async fn build_job_runs_end_to_end() -> TestResult {
    init_tracing();

    let job = JobBuilder::new("build")
        .with_script(script("compile", "echo compiled"))
        .with_serial(vec![
            script("lint", "true"),
            script("test", "echo failing >&2; exit 1"),
            script("package", "echo never"),
        ])
        .build();

    let coordinator = JobCoordinator::new(local_runner());
    let outcome = with_timeout(coordinator.run(job)).await;

    assert!(!outcome.success);
    assert!(outcome.tasks[0].is_success());
    assert_eq!(
        outcome.tasks[0].steps[0].output.as_ref().map(|o| o.stdout.as_str()),
        Some("compiled\n")
    );

    let chain = &outcome.tasks[1];
    assert_eq!(chain.steps.len(), 2);
    match &chain.failure {
        Some(TaskFailure::ChainAbort { step, skipped }) => {
            assert_eq!(step.name, "test");
            assert_eq!(step.error, ScriptError::ScriptFailure(1));
            assert_eq!(skipped, &vec!["package".to_string()]);
        }
        other => panic!("expected ChainAbort, got {other:?}"),
    }
    let stderr = chain.steps[1].output.as_ref().ok_or("missing output")?;
    assert_eq!(stderr.stderr, "failing\n");
    Ok(())
}

#[tokio::test]
async fn serial_steps_observe_each_others_side_effects() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("marker");
    let marker = marker.to_string_lossy();

    let job = JobBuilder::new("handoff")
        .with_serial(vec![
            script("write", &format!("echo one > '{marker}'")),
            script("append", &format!("echo two >> '{marker}'")),
            script("read", &format!("cat '{marker}'")),
        ])
        .build();

    let outcome = with_timeout(JobCoordinator::new(local_runner()).run(job)).await;

    assert!(outcome.success);
    let read = &outcome.tasks[0].steps[2];
    assert_eq!(
        read.output.as_ref().map(|o| o.stdout.as_str()),
        Some("one\ntwo\n")
    );
    Ok(())
}

#[tokio::test]
async fn descendants_holding_output_open_do_not_delay_the_result() -> TestResult {
    init_tracing();

    let s = script("spawner", "echo started\nsleep 3 &\nexit 0");

    let started = Instant::now();
    let outcome = with_timeout(local_runner().run(&s)).await;

    assert_eq!(outcome.status, ScriptStatus::Exited);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "waited for the background child: {:?}",
        started.elapsed()
    );
    assert_eq!(outcome.output.ok_or("missing output")?.stdout, "started\n");
    Ok(())
}
