//! Result aggregation and reporting.
//!
//! Collects classified rows and skipped tokens and produces the final report.

use crate::engine::normalize::BitVector;
use crate::{ClassifierError, TokenDescriptor, UNKNOWN};

/// Leading report columns, before one column per check
pub const METADATA_COLUMNS: [&str; 4] = ["Name", "Symbol", "Decimals", "Address"];

/// One classified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub token: TokenDescriptor,
    pub bits: BitVector,
}

impl ResultRow {
    /// Row values in report column order, metadata first
    pub fn fields(&self) -> Vec<String> {
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let mut fields = vec![
            or_unknown(&self.token.name),
            or_unknown(&self.token.symbol),
            or_unknown(&self.token.decimals),
            self.token.address.clone(),
        ];
        fields.extend(self.bits.iter().map(|b| b.to_string()));
        fields
    }
}

/// A token dropped from the report, with the cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFailure {
    pub token: TokenDescriptor,
    pub error: ClassifierError,
}

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSummary {
    pub requested: usize,
    pub classified: usize,
    pub skipped: usize,
    /// Passing token count per check, in catalog order
    pub pass_counts: Vec<(String, usize)>,
}

/// Classification report: header plus rows in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub checks: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub failures: Vec<TokenFailure>,
}

impl Report {
    /// Full header line values
    pub fn header(&self) -> Vec<String> {
        METADATA_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.checks.iter().cloned())
            .collect()
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        let pass_counts = self
            .checks
            .iter()
            .enumerate()
            .map(|(i, check)| {
                let passed = self
                    .rows
                    .iter()
                    .filter(|row| row.bits.get(i) == Some(&1))
                    .count();
                (check.clone(), passed)
            })
            .collect();

        ResultSummary {
            requested: self.rows.len() + self.failures.len(),
            classified: self.rows.len(),
            skipped: self.failures.len(),
            pass_counts,
        }
    }
}

/// Result aggregator for collecting rows during a batch
pub struct ResultAggregator {
    checks: Vec<String>,
    rows: Vec<ResultRow>,
    failures: Vec<TokenFailure>,
}

impl ResultAggregator {
    /// Create an aggregator for the given column order
    pub fn new(checks: &[String]) -> Self {
        ResultAggregator {
            checks: checks.to_vec(),
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Append a classified token
    pub fn add_row(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    /// Record a skipped token
    pub fn add_failure(&mut self, token: TokenDescriptor, error: ClassifierError) {
        log::warn!("Skipping token {}: {}", token, error);
        self.failures.push(TokenFailure { token, error });
    }

    /// Create final report
    pub fn into_report(self) -> Report {
        Report {
            checks: self.checks,
            rows: self.rows,
            failures: self.failures,
        }
    }
}
