// tests/script_preparation.rs

use std::io;

use jobrunner::config::{Environment, Shell};
use jobrunner::engine::EngineError;
use jobrunner::exec::remote::{classify_session_error, remote_command_line, shell_quote};
use jobrunner::exec::{EnvVars, Invocation, PreparedCommand, ScriptRunner, environment, shell};
use jobrunner_test_utils::builders::ScriptBuilder;

#[test]
fn bash_resolves_to_the_bash_interpreter() {
    let inv = shell::resolve(&Shell::Bash);
    assert_eq!(inv.program, "bash");
    assert!(inv.args.is_empty());
    assert_eq!(inv.args_for("/tmp/s"), vec!["/tmp/s".to_string()]);
}

#[test]
fn custom_shell_is_split_into_program_and_args() {
    let inv = shell::resolve(&Shell::Custom("python3 -u  -B".to_string()));
    assert_eq!(inv.program, "python3");
    assert_eq!(inv.args, vec!["-u".to_string(), "-B".to_string()]);
    assert_eq!(inv.to_string(), "python3 -u -B");
    assert_eq!(
        inv.args_for("/tmp/s"),
        vec!["-u".to_string(), "-B".to_string(), "/tmp/s".to_string()]
    );
}

#[test]
fn custom_shell_that_does_not_exist_still_resolves() {
    let inv = shell::resolve(&Shell::Custom("/no/such/interpreter".to_string()));
    assert_eq!(inv.program, "/no/such/interpreter");
}

#[test]
fn environment_none_is_empty() {
    assert!(environment::build(Environment::None).is_empty());
}

#[test]
fn environment_current_is_a_snapshot_of_this_process() {
    let expected: EnvVars = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();

    assert_eq!(environment::build(Environment::Current), expected);
}

#[test]
fn prepare_combines_shell_body_and_environment() {
    let script = ScriptBuilder::new("greet", "echo hi")
        .custom_shell("sh -e")
        .inherit_env()
        .build();

    let prepared = ScriptRunner::prepare(&script);
    assert_eq!(prepared.label, "greet");
    assert_eq!(prepared.body, "echo hi");
    assert_eq!(
        prepared.invocation,
        Invocation {
            program: "sh".to_string(),
            args: vec!["-e".to_string()]
        }
    );
    assert_eq!(prepared.env, environment::build(Environment::Current));
}

fn prepared(env: &[(&str, &str)]) -> PreparedCommand {
    PreparedCommand {
        label: "deploy".to_string(),
        invocation: shell::resolve(&Shell::Custom("python3 -u".to_string())),
        body: "print('hi')".to_string(),
        env: env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[test]
fn remote_blocking_command_runs_staged_script_with_exact_environment() {
    let cmd = prepared(&[("GREETING", "it's me"), ("bad-name", "x")]);
    let line = remote_command_line(&cmd, false);

    assert_eq!(
        line,
        "f=$(mktemp) && cat > \"$f\" && { env -i 'GREETING=it'\\''s me' 'python3' '-u' \"$f\"; \
         s=$?; rm -f \"$f\"; exit $s; }"
    );
}

#[test]
fn remote_detached_command_backgrounds_the_interpreter() {
    let line = remote_command_line(&prepared(&[]), true);

    assert!(line.starts_with("f=$(mktemp) && cat > \"$f\" && { ( trap '' HUP; env -i 'python3' '-u' \"$f\";"));
    assert!(line.ends_with(") >/dev/null 2>&1 </dev/null & }"));
}

#[test]
fn shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("plain"), "'plain'");
    assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    assert_eq!(shell_quote(""), "''");
}

#[test]
fn ssh_session_errors_are_classified() {
    let denied = openssh::Error::Connect(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "Permission denied (publickey).",
    ));
    assert!(matches!(
        classify_session_error("h", &denied),
        EngineError::AuthFailed { .. }
    ));

    let unresolved = openssh::Error::Connect(io::Error::other(
        "Could not resolve hostname h: Name or service not known",
    ));
    match classify_session_error("h", &unresolved) {
        EngineError::HostUnreachable { host, detail } => {
            assert_eq!(host, "h");
            assert!(detail.contains("Could not resolve hostname"));
        }
        other => panic!("expected HostUnreachable, got {other:?}"),
    }

    let refused = openssh::Error::Connect(io::Error::from(io::ErrorKind::ConnectionRefused));
    assert!(matches!(
        classify_session_error("h", &refused),
        EngineError::HostUnreachable { .. }
    ));

    assert!(matches!(
        classify_session_error("h", &openssh::Error::Disconnected),
        EngineError::Transport { .. }
    ));
}
