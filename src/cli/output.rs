//! Output formatting for erc20-classifier.
//!
//! Provides CSV, JSON, and terminal report formatters.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Missing metadata: Rendered as "unknown", never as an empty field
//! - Commas or quotes in token names: CSV fields are quoted and escaped
//! - Empty reports: Produce a header (CSV) or an empty row list (JSON/text)
//! - Non-TTY output: Color disabled via NO_COLOR or --no-color
//!
//! All formatters produce valid output for any Report input and are
//! deterministic: the same report always renders to the same bytes.

use crate::cli::args::OutputFormat;
use crate::engine::normalize::bits_to_string;
use crate::engine::result::Report;
use serde_json::{json, Map, Value};
use std::borrow::Cow;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a report into a string
    fn format(&self, report: &Report) -> String;
}

/// CSV formatter, the canonical report format
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        CsvFormatter
    }

    fn escape_csv(field: &str) -> Cow<'_, str> {
        if field.contains([',', '"', '\n', '\r']) {
            Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(field)
        }
    }

    fn line(fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| Self::escape_csv(f))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = Self::line(&report.header());
        for row in &report.rows {
            output.push('\n');
            output.push_str(&Self::line(&row.fields()));
        }
        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }

    fn to_value(report: &Report) -> Value {
        let rows: Vec<Value> = report
            .rows
            .iter()
            .map(|row| {
                let results: Map<String, Value> = report
                    .checks
                    .iter()
                    .zip(&row.bits)
                    .map(|(check, bit)| (check.clone(), Value::Bool(*bit == 1)))
                    .collect();
                let fields = row.fields();
                json!({
                    "name": fields[0],
                    "symbol": fields[1],
                    "decimals": fields[2],
                    "address": row.token.address,
                    "bits": bits_to_string(&row.bits),
                    "results": results,
                })
            })
            .collect();

        let skipped: Vec<Value> = report
            .failures
            .iter()
            .map(|failure| {
                json!({
                    "name": failure.token.display_name(),
                    "address": failure.token.address,
                    "error": failure.error.to_string(),
                })
            })
            .collect();

        let summary = report.summary();
        let pass_counts: Map<String, Value> = summary
            .pass_counts
            .iter()
            .map(|(check, count)| (check.clone(), json!(count)))
            .collect();

        json!({
            "checks": report.checks,
            "rows": rows,
            "skipped": skipped,
            "summary": {
                "requested": summary.requested,
                "classified": summary.classified,
                "skipped": summary.skipped,
                "pass_counts": pass_counts,
            },
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> String {
        let value = Self::to_value(report);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        // serializing a Value cannot fail
        rendered.unwrap_or_default()
    }
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn gray(&self, text: &str) -> String {
        self.colorize(text, "90")
    }

    fn bit_marker(&self, bit: u8) -> String {
        if bit == 1 {
            self.green("1")
        } else {
            self.red("0")
        }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &Report) -> String {
        let rule = "-".repeat(80);
        let mut output = String::new();

        output.push_str(&rule);
        output.push('\n');
        output.push_str("erc20-classifier report\n");
        output.push_str(&format!("Checks: {}\n", report.checks.len()));
        output.push_str(&rule);
        output.push_str("\n\n");

        // the legend is the only part quiet mode drops
        if !self.quiet {
            output.push_str("COLUMNS\n");
            for (i, check) in report.checks.iter().enumerate() {
                output.push_str(&format!("  {:>3}  {}\n", i + 1, check));
            }
            output.push('\n');
        }

        output.push_str("TOKENS\n");
        for row in &report.rows {
            let bits: String = row.bits.iter().map(|b| self.bit_marker(*b)).collect();
            let fields = row.fields();
            output.push_str(&format!(
                "  {} {} ({}, {} decimals) {}\n",
                bits, fields[0], fields[1], fields[2], self.gray(&row.token.address)
            ));

            if self.verbose {
                for (check, bit) in report.checks.iter().zip(&row.bits) {
                    let status = if *bit == 1 {
                        self.green("[PASS]")
                    } else {
                        self.red("[FAIL]")
                    };
                    output.push_str(&format!("      {} {}\n", status, check));
                }
            }
        }
        output.push('\n');

        if !report.failures.is_empty() {
            output.push_str("SKIPPED\n");
            for failure in &report.failures {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    self.yellow("[SKIP]"),
                    failure.token,
                    failure.error
                ));
            }
            output.push('\n');
        }

        let summary = report.summary();
        output.push_str(&rule);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} classified, {} skipped, {} requested\n",
            summary.classified, summary.skipped, summary.requested
        ));
        output.push_str(&rule);

        output
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: &OutputFormat,
    no_color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Text => Box::new(TerminalFormatter::new(!no_color, verbose, quiet)),
    }
}
