//! Output format integration tests.
//!
//! Tests for CSV, JSON, and terminal report rendering.

use erc20_classifier::cli::args::OutputFormat;
use erc20_classifier::cli::output::{get_formatter, CsvFormatter, JsonFormatter, OutputFormatter, TerminalFormatter};
use erc20_classifier::engine::result::ResultAggregator;
use erc20_classifier::{ClassifierError, Report, ResultRow, TokenDescriptor};

fn checks() -> Vec<String> {
    vec!["testApprove".to_string(), "testTransfer".to_string()]
}

fn sample_report() -> Report {
    let mut aggregator = ResultAggregator::new(&checks());

    aggregator.add_row(ResultRow {
        token: TokenDescriptor {
            address: "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
            name: Some("Tether USD".to_string()),
            symbol: Some("USDT".to_string()),
            decimals: Some("6".to_string()),
        },
        bits: vec![1, 0],
    });
    aggregator.add_row(ResultRow {
        token: TokenDescriptor::new("0x0000000000000000000000000000000000000001"),
        bits: vec![0, 1],
    });
    aggregator.add_failure(
        TokenDescriptor::new("0x0000000000000000000000000000000000000002"),
        ClassifierError::ExecutionError {
            address: "0x0000000000000000000000000000000000000002".to_string(),
            message: "timed out after 10ms".to_string(),
        },
    );

    aggregator.into_report()
}

#[test]
fn test_csv_output() {
    let output = CsvFormatter::new().format(&sample_report());
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Name,Symbol,Decimals,Address,testApprove,testTransfer");
    assert_eq!(
        lines[1],
        "Tether USD,USDT,6,0xdac17f958d2ee523a2206206994597c13d831ec7,1,0"
    );
    // missing metadata is never rendered as an empty field
    assert_eq!(
        lines[2],
        "unknown,unknown,unknown,0x0000000000000000000000000000000000000001,0,1"
    );
}

#[test]
fn test_csv_rows_have_header_width() {
    let output = CsvFormatter::new().format(&sample_report());
    let widths: Vec<usize> = output.lines().map(|l| l.split(',').count()).collect();
    assert!(widths.iter().all(|w| *w == widths[0]));
}

#[test]
fn test_csv_quotes_awkward_names() {
    let mut aggregator = ResultAggregator::new(&checks());
    aggregator.add_row(ResultRow {
        token: TokenDescriptor {
            address: "0x01".to_string(),
            name: Some("Foo, \"Bar\"".to_string()),
            symbol: Some("FB".to_string()),
            decimals: None,
        },
        bits: vec![1, 1],
    });

    let output = CsvFormatter::new().format(&aggregator.into_report());
    assert!(output.ends_with("\"Foo, \"\"Bar\"\"\",FB,unknown,0x01,1,1"));
}

#[test]
fn test_skipped_tokens_not_in_csv() {
    let output = CsvFormatter::new().format(&sample_report());
    assert!(!output.contains("0x0000000000000000000000000000000000000002"));
}

#[test]
fn test_json_output() {
    let output = JsonFormatter::new(false).format(&sample_report());
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["checks"][0], "testApprove");
    assert_eq!(value["rows"][0]["symbol"], "USDT");
    assert_eq!(value["rows"][0]["bits"], "10");
    assert_eq!(value["rows"][0]["results"]["testApprove"], true);
    assert_eq!(value["rows"][0]["results"]["testTransfer"], false);
    assert_eq!(value["rows"][1]["name"], "unknown");
    assert_eq!(
        value["skipped"][0]["address"],
        "0x0000000000000000000000000000000000000002"
    );
    assert_eq!(value["summary"]["requested"], 3);
    assert_eq!(value["summary"]["classified"], 2);
    assert_eq!(value["summary"]["skipped"], 1);
    assert_eq!(value["summary"]["pass_counts"]["testApprove"], 1);
}

#[test]
fn test_terminal_output() {
    let output = TerminalFormatter::new(false, false, false).format(&sample_report());

    assert!(output.contains("Tether USD (USDT, 6 decimals)"));
    assert!(output.contains("testTransfer"));
    assert!(output.contains("[SKIP]"));
    assert!(output.contains("timed out after 10ms"));
    assert!(output.contains("SUMMARY: 2 classified, 1 skipped, 3 requested"));
}

#[test]
fn test_terminal_quiet_keeps_rows_and_drops_legend() {
    let output = TerminalFormatter::new(false, false, true).format(&sample_report());
    assert!(output.contains("Tether USD (USDT, 6 decimals)"));
    assert!(output.contains("[SKIP]"));
    assert!(!output.contains("COLUMNS"));

    let full = TerminalFormatter::new(false, false, false).format(&sample_report());
    assert!(full.contains("COLUMNS"));
}

#[test]
fn test_terminal_verbose_lists_each_check() {
    let output = TerminalFormatter::new(false, true, false).format(&sample_report());
    assert!(output.contains("[PASS] testApprove"));
    assert!(output.contains("[FAIL] testTransfer"));
}

#[test]
fn test_get_formatter() {
    let report = sample_report();
    let csv = get_formatter(&OutputFormat::Csv, true, false, false).format(&report);
    assert!(csv.starts_with("Name,Symbol,Decimals,Address"));

    let json = get_formatter(&OutputFormat::Json, true, false, false).format(&report);
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

    let text = get_formatter(&OutputFormat::Text, true, false, false).format(&report);
    assert!(!text.contains('\x1b'));
}

#[test]
fn test_formatting_is_deterministic() {
    let report = sample_report();
    for format in [OutputFormat::Csv, OutputFormat::Json, OutputFormat::Text] {
        let formatter = get_formatter(&format, true, false, false);
        assert_eq!(formatter.format(&report), formatter.format(&report));
    }
}
