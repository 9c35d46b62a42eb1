//! Check catalog resolution.
//!
//! Asks the engine which checks the target suite defines and fixes the
//! column order every report row is aligned to.
//!
//! # Graceful Degradation
//!
//! Catalog problems are never degraded: without a column set there is no
//! meaningful report, so every failure here is `CatalogUnavailable`.
//! - Engine not runnable: CatalogUnavailable with the engine error
//! - Output not JSON of the listing shape: CatalogUnavailable with decode error
//! - Test file or contract absent from the listing: CatalogUnavailable
//! - Suite present but empty: Allowed, yields an empty catalog

use crate::platform::forge::{SuiteSpec, TestEngine};
use crate::ClassifierError;
use serde_json::{Map, Value};

/// Sorted, de-duplicated check names for one run.
///
/// Order is byte-wise lexicographic and is shared by the report header and
/// every row's bit-vector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckCatalog {
    names: Vec<String>,
}

impl CheckCatalog {
    /// Build a catalog from names in any order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort_unstable();
        names.dedup();
        CheckCatalog { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Canonical check name: the test function name without its parameter list.
///
/// `forge test --list` prints bare names (`testTransfer`) while run reports
/// key results by signature (`testTransfer()`); both reduce to the same name.
pub fn check_name(raw: &str) -> &str {
    match raw.find('(') {
        Some(paren) => raw[..paren].trim(),
        None => raw.trim(),
    }
}

/// Resolve the checks defined for `suite`, in engine order.
pub fn resolve_checks(
    engine: &dyn TestEngine,
    suite: &SuiteSpec,
) -> Result<Vec<String>, ClassifierError> {
    let payload = engine
        .list(suite)
        .map_err(|e| ClassifierError::CatalogUnavailable {
            suite: suite.result_key(),
            message: e.to_string(),
        })?;
    decode_listing(&payload, suite)
}

/// Decode `forge test --list --json` output and pick out one suite.
pub fn decode_listing(payload: &str, suite: &SuiteSpec) -> Result<Vec<String>, ClassifierError> {
    let unavailable = |message: String| ClassifierError::CatalogUnavailable {
        suite: suite.result_key(),
        message,
    };

    let listing: Map<String, Value> =
        serde_json::from_str(payload).map_err(|e| unavailable(format!("invalid listing: {}", e)))?;

    let contracts = find_test_file(&listing, &suite.test_file)
        .ok_or_else(|| unavailable(format!("test file {} not in listing", suite.test_file)))?;

    let checks = contracts
        .as_object()
        .and_then(|c| c.get(&suite.contract))
        .ok_or_else(|| unavailable(format!("contract {} not in listing", suite.contract)))?;

    let names = serde_json::from_value::<Vec<String>>(checks.clone())
        .map_err(|e| unavailable(format!("invalid check list: {}", e)))?;
    Ok(names.iter().map(|n| check_name(n).to_string()).collect())
}

// forge keys by the path it was given, which may be absolute
fn find_test_file<'a>(listing: &'a Map<String, Value>, test_file: &str) -> Option<&'a Value> {
    listing.get(test_file).or_else(|| {
        let suffix = format!("/{}", test_file.trim_start_matches("./"));
        listing
            .iter()
            .find(|(path, _)| path.ends_with(&suffix))
            .map(|(_, contracts)| contracts)
    })
}
