//! CLI integration tests.
//!
//! Tests for argument parsing and configuration mapping.

use clap::Parser;
use erc20_classifier::cli::args::{Args, Command, OutputFormat};
use erc20_classifier::ClassifierConfig;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Args {
    let mut argv = vec!["erc20-classifier"];
    argv.extend_from_slice(args);
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn test_default_args() {
    let args = parse(&[]);
    assert_eq!(args.selected_command(), Command::Classify);
    assert_eq!(args.corpus, "bad-top");
    assert_eq!(args.test_file, "test/ERC20PostDeploymentTest.sol");
    assert_eq!(args.contract, "ERC20PostDeploymentTest");
    assert!(!args.bind_implementation);
    assert!(!args.fail_on_skip);
    assert!(args.output.is_none());
}

#[test]
fn test_version_command() {
    assert_eq!(parse(&["version"]).selected_command(), Command::Version);
}

#[test]
fn test_classify_command() {
    assert_eq!(parse(&["classify"]).selected_command(), Command::Classify);
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Args::try_parse_from(["erc20-classifier", "check"]).is_err());
}

#[test]
fn test_invalid_format_rejected() {
    assert!(Args::try_parse_from(["erc20-classifier", "--format", "junit"]).is_err());
}

#[test]
fn test_negative_offset_rejected() {
    assert!(Args::try_parse_from(["erc20-classifier", "--offset", "-1"]).is_err());
}

#[test]
fn test_config_from_args() {
    let args = parse(&[
        "classify",
        "--corpus",
        "bad-all",
        "--corpus-root",
        "/data/erc20",
        "--offset",
        "5",
        "--count",
        "20",
        "--contract",
        "MyTest",
        "--bind-implementation",
        "--fork-url",
        "http://127.0.0.1:8545",
        "--jobs",
        "4",
        "--timeout",
        "60000",
        "--name-check",
        "probeName()",
        "--forge",
        "/opt/foundry/bin/forge",
    ]);
    let config = ClassifierConfig::from_args(&args);

    assert_eq!(config.corpus, "bad-all");
    assert_eq!(config.corpus_root, PathBuf::from("/data/erc20"));
    assert_eq!(config.offset, 5);
    assert_eq!(config.count, 20);
    assert_eq!(config.suite.contract, "MyTest");
    assert!(config.suite.bind_implementation);
    assert_eq!(config.fork_url.as_deref(), Some("http://127.0.0.1:8545"));
    assert_eq!(config.jobs, 4);
    assert_eq!(config.timeout_ms, Some(60000));
    assert_eq!(config.probes.name_check, "probeName()");
    assert_eq!(config.probes.symbol_check, "testSymbol");
    assert_eq!(config.forge_binary, PathBuf::from("/opt/foundry/bin/forge"));
}

#[test]
fn test_output_options() {
    let args = parse(&["--format", "json", "-o", "report.json", "--fail-on-skip", "--no-color"]);
    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(args.output, Some(PathBuf::from("report.json")));
    assert!(args.fail_on_skip);
    assert!(!args.color_enabled());
}
