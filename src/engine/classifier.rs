//! Per-token classification.
//!
//! Runs the suite for one token and decodes forge's `--json` report into a
//! `SuiteResult`.
//!
//! forge has reported check outcomes in two shapes over time:
//! - `{"success": true, "reason": null, ...}` (older releases)
//! - `{"status": "Success", "reason": null, ...}` (current releases)
//!
//! Both decode to the same `CheckResult`.

use crate::checks::check_name;
use crate::platform::forge::{ExecutionContext, SuiteSpec, TestEngine};
use crate::{CheckResult, ClassifierError, SuiteResult, TokenDescriptor};
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct SuiteReport {
    test_results: HashMap<String, RawCheckResult>,
}

#[derive(Debug, Deserialize)]
struct RawCheckResult {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl RawCheckResult {
    fn into_check_result(self, check: &str) -> Result<CheckResult, String> {
        let success = match (self.success, self.status.as_deref()) {
            (Some(success), _) => success,
            (None, Some(status)) => status.eq_ignore_ascii_case("success"),
            (None, None) => return Err(format!("check {} has neither success nor status", check)),
        };
        Ok(CheckResult {
            success,
            reason: self.reason,
        })
    }
}

/// Run the suite against one token and extract its named results.
///
/// Never retries; a failed invocation consumes the token's slot.
pub fn classify(
    engine: &dyn TestEngine,
    suite: &SuiteSpec,
    context: &ExecutionContext,
) -> Result<SuiteResult, ClassifierError> {
    let payload = engine
        .run(suite, context)
        .map_err(|e| ClassifierError::ExecutionError {
            address: context.address.clone(),
            message: e.to_string(),
        })?;
    decode_suite_result(&payload, suite, &context.address)
}

/// Decode a `forge test --json` report and pick out one suite's results
pub fn decode_suite_result(
    payload: &str,
    suite: &SuiteSpec,
    address: &str,
) -> Result<SuiteResult, ClassifierError> {
    let execution_error = |message: String| ClassifierError::ExecutionError {
        address: address.to_string(),
        message,
    };

    let mut suites: HashMap<String, SuiteReport> = serde_json::from_str(payload)
        .map_err(|e| execution_error(format!("invalid test report: {}", e)))?;

    let key = suite.result_key();
    let report = match suites.remove(&key) {
        Some(report) => report,
        // absolute test paths show up as "/abs/test/File.sol:Contract"
        None => {
            let suffix = format!("/{}", key);
            let found = suites.keys().find(|k| k.ends_with(&suffix)).cloned();
            found
                .and_then(|k| suites.remove(&k))
                .ok_or_else(|| execution_error(format!("suite {} missing from test report", key)))?
        }
    };

    let mut result = SuiteResult::new();
    for (signature, raw) in report.test_results {
        let outcome = raw.into_check_result(&signature).map_err(execution_error)?;
        // overloads share a name; the check passes only if every overload does
        match result.entry(check_name(&signature).to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().success && !outcome.success {
                    slot.insert(outcome);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(outcome);
            }
        }
    }
    Ok(result)
}

/// Checks whose `reason` carries token metadata.
///
/// Suites can smuggle a token's declared name, symbol and decimals out through
/// the reason of an expected-fail check. Corpus metadata always wins; probes
/// only fill fields the corpus left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataProbes {
    pub name_check: String,
    pub symbol_check: String,
    pub decimals_check: String,
}

impl Default for MetadataProbes {
    fn default() -> Self {
        MetadataProbes {
            name_check: "testName".to_string(),
            symbol_check: "testSymbol".to_string(),
            decimals_check: "testDecimals".to_string(),
        }
    }
}

impl MetadataProbes {
    /// Fill absent metadata from probe reasons
    pub fn apply(&self, token: &TokenDescriptor, result: &SuiteResult) -> TokenDescriptor {
        let probe = |check: &str| {
            result
                .get(check_name(check))
                .and_then(|r| r.reason.as_deref())
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map(str::to_string)
        };

        TokenDescriptor {
            address: token.address.clone(),
            name: token.name.clone().or_else(|| probe(&self.name_check)),
            symbol: token.symbol.clone().or_else(|| probe(&self.symbol_check)),
            decimals: token
                .decimals
                .clone()
                .or_else(|| probe(&self.decimals_check)),
        }
    }
}
