//! erc20-classifier library
//!
//! Batch classification of ERC-20 token contracts against a forge
//! post-deployment test suite.
//!
//! This library provides the whole classification pipeline:
//! - Check catalog resolution (`forge test --list`)
//! - Token corpus loading and slicing
//! - Per-token suite execution against a mainnet fork
//! - Normalization of named check results into ordered bit-vectors
//! - Batch aggregation with per-token failure isolation
//!
//! # Example
//!
//! ```no_run
//! use erc20_classifier::platform::forge::ForgeEngine;
//! use erc20_classifier::{run_classification, ClassifierConfig};
//!
//! let config = ClassifierConfig {
//!     fork_url: Some("http://localhost:8545".to_string()),
//!     ..Default::default()
//! };
//! let engine = ForgeEngine::from_config(&config);
//! let report = run_classification(&config, &engine).expect("Classification failed");
//! println!("Tokens classified: {}", report.summary().classified);
//! ```

pub mod checks;
pub mod cli;
pub mod data;
pub mod engine;
pub mod platform;
pub mod version;

use checks::CheckCatalog;
use cli::args::Args;
use engine::classifier::{classify, MetadataProbes};
use engine::normalize::normalize;
use engine::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use platform::forge::{ExecutionContext, SuiteSpec, TestEngine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

// Re-exports for public API
pub use engine::result::{Report, ResultRow, ResultSummary, TokenFailure};

/// Placeholder rendered for metadata the corpus and the suite both lack.
pub const UNKNOWN: &str = "unknown";

/// Outcome of one check for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,
    /// Free-text diagnostic from the engine (revert reason, probe payload)
    #[serde(default)]
    pub reason: Option<String>,
}

impl CheckResult {
    pub fn pass() -> Self {
        CheckResult {
            success: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        CheckResult {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.success, &self.reason) {
            (true, _) => write!(f, "PASS"),
            (false, Some(reason)) => write!(f, "FAIL ({})", reason),
            (false, None) => write!(f, "FAIL"),
        }
    }
}

/// Named check results for exactly one token.
pub type SuiteResult = HashMap<String, CheckResult>;

/// Known metadata about a token, as loaded from a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenDescriptor {
    /// 0x-prefixed contract address
    #[serde(alias = "addr")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(
        default,
        deserialize_with = "data::corpus::deserialize_decimals",
        skip_serializing_if = "Option::is_none"
    )]
    pub decimals: Option<String>,
}

impl TokenDescriptor {
    /// Descriptor with only an address
    pub fn new(address: impl Into<String>) -> Self {
        TokenDescriptor {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Name for log lines and warnings
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

/// Error types for classifier operations.
///
/// `CatalogUnavailable`, `UnknownCorpus`, `CorpusParseError`, `Config` and
/// `Output` end the run. `ExecutionError` and `MissingCheckResult` only drop
/// the token they occurred for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The engine could not list the suite's checks
    #[error("Check catalog unavailable for {suite}: {message}")]
    CatalogUnavailable { suite: String, message: String },

    /// Corpus identifier is not on the allow-list
    #[error("Unknown corpus '{corpus}' (expected one of: {known})")]
    UnknownCorpus { corpus: String, known: String },

    /// Corpus file missing or not one of the supported shapes
    #[error("Corpus parse error in {}: {message}", path.display())]
    CorpusParseError { path: PathBuf, message: String },

    /// Suite run for one token produced no usable result
    #[error("Execution error for {address}: {message}")]
    ExecutionError { address: String, message: String },

    /// Catalog and per-token run disagree about the check set
    #[error("No result for check '{check}'")]
    MissingCheckResult { check: String },

    /// Invalid or incomplete run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report could not be written
    #[error("Output error in {context}: {message}")]
    Output { context: String, message: String },
}

impl ClassifierError {
    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ClassifierError::ExecutionError { .. } | ClassifierError::MissingCheckResult { .. }
        )
    }
}

/// API credentials forwarded to the engine.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Used to build the default Infura fork endpoint
    pub infura_api_key: Option<String>,
    /// Exported to the suite as `ETHERSCAN_API_KEY`
    pub etherscan_api_key: Option<String>,
}

// Keys never reach log output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("infura_api_key", &mask(&self.infura_api_key))
            .field("etherscan_api_key", &mask(&self.etherscan_api_key))
            .finish()
    }
}

/// Configuration for a classification run.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Corpus identifier (see `data::corpus::CorpusId`)
    pub corpus: String,
    /// Directory corpus paths are resolved against
    pub corpus_root: PathBuf,
    pub offset: usize,
    pub count: usize,
    pub suite: SuiteSpec,
    pub credentials: Credentials,
    /// Explicit fork endpoint; overrides the Infura default
    pub fork_url: Option<String>,
    pub probes: MetadataProbes,
    /// Path to the forge binary
    pub forge_binary: PathBuf,
    /// Working directory for forge (the Foundry project)
    pub project_root: Option<PathBuf>,
    /// Per-invocation timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Number of tokens classified concurrently
    pub jobs: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            corpus: "bad-top".to_string(),
            corpus_root: PathBuf::from("."),
            offset: 0,
            count: 3,
            suite: SuiteSpec::default(),
            credentials: Credentials::default(),
            fork_url: None,
            probes: MetadataProbes::default(),
            forge_binary: PathBuf::from("forge"),
            project_root: None,
            timeout_ms: None,
            jobs: 1,
        }
    }
}

impl ClassifierConfig {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Self {
        ClassifierConfig {
            corpus: args.corpus.clone(),
            corpus_root: args.corpus_root.clone(),
            offset: args.offset,
            count: args.count,
            suite: SuiteSpec {
                test_file: args.test_file.clone(),
                contract: args.contract.clone(),
                bind_implementation: args.bind_implementation,
            },
            credentials: Credentials {
                infura_api_key: args.infura_api_key.clone(),
                etherscan_api_key: args.etherscan_api_key.clone(),
            },
            fork_url: args.fork_url.clone(),
            probes: MetadataProbes {
                name_check: args.name_check.clone(),
                symbol_check: args.symbol_check.clone(),
                decimals_check: args.decimals_check.clone(),
            },
            forge_binary: args.forge.clone(),
            project_root: args.project_root.clone(),
            timeout_ms: args.timeout_ms,
            jobs: args.jobs.max(1),
        }
    }

    /// Fork endpoint the suite runs against
    pub fn fork_endpoint(&self) -> Result<String, ClassifierError> {
        if let Some(ref url) = self.fork_url {
            return Ok(url.clone());
        }
        match self.credentials.infura_api_key {
            Some(ref key) if !key.is_empty() => Ok(format!("https://mainnet.infura.io/v3/{}", key)),
            _ => Err(ClassifierError::Config(
                "no fork endpoint: pass --fork-url or set INFURA_API_KEY".to_string(),
            )),
        }
    }
}

/// Resolve the sorted check catalog for the configured suite.
pub fn list_checks(
    config: &ClassifierConfig,
    engine: &dyn TestEngine,
) -> Result<CheckCatalog, ClassifierError> {
    let names = checks::resolve_checks(engine, &config.suite)?;
    Ok(CheckCatalog::new(names))
}

/// Run a classification batch.
///
/// This is the main entry point: it loads the corpus slice, resolves the
/// check catalog, and classifies every token in corpus order.
///
/// # Errors
///
/// Returns an error only for run-level failures (bad configuration, unknown
/// or unreadable corpus, unavailable catalog). Per-token failures are
/// recorded in `Report::failures` instead.
pub fn run_classification(
    config: &ClassifierConfig,
    engine: &dyn TestEngine,
) -> Result<Report, ClassifierError> {
    let start = Instant::now();
    let fork_url = config.fork_endpoint()?;

    let tokens = data::corpus::load_addresses(
        &config.corpus_root,
        &config.corpus,
        config.offset,
        config.count,
    )?;
    log::info!(
        "Loaded {} token(s) from corpus '{}' (offset {}, count {})",
        tokens.len(),
        config.corpus,
        config.offset,
        config.count
    );

    let catalog = list_checks(config, engine)?;
    if catalog.is_empty() {
        log::warn!(
            "{} defines no checks, rows will carry metadata only",
            config.suite.result_key()
        );
    } else {
        log::info!(
            "Resolved {} check(s) for {}",
            catalog.len(),
            config.suite.result_key()
        );
    }

    let orchestrator = BatchOrchestrator::new(OrchestratorConfig {
        jobs: config.jobs,
        probes: Some(config.probes.clone()),
    });

    let report = orchestrator.run_batch(
        &catalog,
        tokens,
        |token: &TokenDescriptor| {
            let context = ExecutionContext::for_token(
                &token.address,
                &config.suite,
                &fork_url,
                config.credentials.etherscan_api_key.as_deref(),
            );
            classify(engine, &config.suite, &context)
        },
        normalize,
    );

    let summary = report.summary();
    log::info!(
        "Classified {}/{} token(s), skipped {} in {:.1}s",
        summary.classified,
        summary.requested,
        summary.skipped,
        start.elapsed().as_secs_f64()
    );
    for (check, passed) in &summary.pass_counts {
        log::debug!("{}: {}/{} passed", check, passed, summary.classified);
    }

    Ok(report)
}
