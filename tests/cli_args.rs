// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;

use jobrunner::cli::{CliArgs, KnownHostsPolicy, ReportFormat};
use jobrunner::exec::HostKeyCheck;

#[test]
fn defaults() {
    let args = CliArgs::try_parse_from(["jobrunner"]).expect("no arguments is valid");

    assert_eq!(args.job, PathBuf::from("Job.toml"));
    assert!(!args.dry_run);
    assert!(!args.print_example);
    assert_eq!(args.format, ReportFormat::Text);
    assert!(!args.print_schema);
    assert_eq!(args.known_hosts, KnownHostsPolicy::Strict);
    assert_eq!(args.connect_timeout, 10);
    assert!(args.log_level.is_none());
}

#[test]
fn all_flags() {
    let args = CliArgs::try_parse_from([
        "jobrunner",
        "--job",
        "ci/build.json",
        "--dry-run",
        "--format",
        "json",
        "--known-hosts",
        "add",
        "--connect-timeout",
        "3",
        "--log-level",
        "debug",
    ])
    .expect("valid arguments");

    assert_eq!(args.job, PathBuf::from("ci/build.json"));
    assert!(args.dry_run);
    assert_eq!(args.format, ReportFormat::Json);
    assert_eq!(HostKeyCheck::from(args.known_hosts), HostKeyCheck::Add);
    assert_eq!(args.connect_timeout, 3);
    assert!(args.log_level.is_some());
}

#[test]
fn unknown_report_format_is_rejected() {
    assert!(CliArgs::try_parse_from(["jobrunner", "--format", "yaml"]).is_err());
}

#[test]
fn print_schema_flag() {
    let args = CliArgs::try_parse_from(["jobrunner", "--print-schema"]).expect("valid arguments");
    assert!(args.print_schema);
}
