//! Mock test engine.
//!
//! Serves a canned `forge test --list --json` listing and per-address
//! `forge test --json` reports without spawning anything.
//!
//! Like forge, the listing carries bare function names while run reports key
//! results by signature.

#![allow(dead_code)]

use erc20_classifier::platform::forge::{EngineError, ExecutionContext, SuiteSpec, TestEngine};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the engine does when asked to run one token
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Report these (check, success, reason) outcomes
    Results(Vec<(String, bool, Option<String>)>),
    /// Return this payload verbatim
    Payload(String),
    /// Fail the invocation
    Error(EngineError),
    /// Panic inside the engine
    Panic,
}

/// Configurable in-process engine
pub struct MockEngine {
    suite: SuiteSpec,
    checks: Vec<String>,
    listing_error: Option<EngineError>,
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<ExecutionContext>>,
}

impl MockEngine {
    /// Engine whose listing holds `checks` and whose runs pass every check.
    ///
    /// `checks` are signatures as they appear in run reports.
    pub fn new(checks: &[&str]) -> Self {
        MockEngine {
            suite: SuiteSpec::default(),
            checks: checks.iter().map(|c| c.to_string()).collect(),
            listing_error: None,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_suite(mut self, suite: SuiteSpec) -> Self {
        self.suite = suite;
        self
    }

    /// Make `list` fail
    pub fn with_listing_error(mut self, error: EngineError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn with_response(mut self, address: &str, response: MockResponse) -> Self {
        self.responses.insert(address.to_string(), response);
        self
    }

    /// Every listed check passes except the named ones
    pub fn with_failures(self, address: &str, failing: &[&str]) -> Self {
        let results = self
            .checks
            .iter()
            .map(|check| {
                let failed = failing.contains(&check.as_str());
                let reason = failed.then(|| "assertion failed".to_string());
                (check.clone(), !failed, reason)
            })
            .collect();
        self.with_response(address, MockResponse::Results(results))
    }

    /// Addresses the engine was asked to run, in call order
    pub fn called_addresses(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|c| c.address.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<ExecutionContext> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn listing(&self) -> String {
        let names: Vec<&str> = self.checks.iter().map(|c| bare_name(c)).collect();
        json!({
            self.suite.test_file.clone(): {
                self.suite.contract.clone(): names,
            },
            "test/Unrelated.t.sol": {
                "UnrelatedTest": ["testUnrelated"],
            },
        })
        .to_string()
    }

    fn all_pass(&self) -> Vec<(String, bool, Option<String>)> {
        self.checks.iter().map(|c| (c.clone(), true, None)).collect()
    }
}

/// Function name of a test signature, as `forge test --list` prints it
pub fn bare_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature)
}

/// A `forge test --json` report for one suite in the current `status` shape
pub fn suite_report(suite: &SuiteSpec, results: &[(String, bool, Option<String>)]) -> String {
    let test_results: Map<String, Value> = results
        .iter()
        .map(|(check, success, reason)| {
            let status = if *success { "Success" } else { "Failure" };
            (
                check.clone(),
                json!({
                    "status": status,
                    "reason": reason,
                    "counterexample": null,
                    "decoded_logs": [],
                }),
            )
        })
        .collect();

    json!({
        suite.result_key(): {
            "duration": "1ms",
            "test_results": test_results,
        }
    })
    .to_string()
}

impl TestEngine for MockEngine {
    fn list(&self, _suite: &SuiteSpec) -> Result<String, EngineError> {
        match self.listing_error {
            Some(ref error) => Err(error.clone()),
            None => Ok(self.listing()),
        }
    }

    fn run(&self, suite: &SuiteSpec, context: &ExecutionContext) -> Result<String, EngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(context.clone());
        }

        match self.responses.get(&context.address) {
            Some(MockResponse::Results(results)) => Ok(suite_report(suite, results)),
            Some(MockResponse::Payload(payload)) => Ok(payload.clone()),
            Some(MockResponse::Error(error)) => Err(error.clone()),
            Some(MockResponse::Panic) => panic!("mock engine panic for {}", context.address),
            None => Ok(suite_report(suite, &self.all_pass())),
        }
    }
}
