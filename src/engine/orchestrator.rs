//! Batch execution orchestrator.
//!
//! Drives classification and normalization over every token of a corpus
//! slice and assembles the report.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - Classifier error: Token is logged as skipped, batch continues
//! - Missing check result: Token is logged as skipped, batch continues
//! - Classifier panic: Caught via std::panic::catch_unwind, treated as ExecutionError
//! - Empty token list: Returns a report with a header and no rows
//!
//! Rows always appear in token order, with or without parallel execution.
//! No retries happen here; one failed invocation consumes the token's slot.
//! No function in this module will panic.

use crate::checks::CheckCatalog;
use crate::engine::classifier::MetadataProbes;
use crate::engine::normalize::BitVector;
use crate::engine::result::{Report, ResultAggregator, ResultRow};
use crate::{ClassifierError, SuiteResult, TokenDescriptor};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Tokens classified at the same time; 1 runs strictly sequentially
    pub jobs: usize,
    /// Fill missing metadata from probe checks
    pub probes: Option<MetadataProbes>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            jobs: 1,
            probes: None,
        }
    }
}

/// Batch orchestrator
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(config: OrchestratorConfig) -> Self {
        BatchOrchestrator { config }
    }

    /// Classify every token and collect the rows in token order
    pub fn run_batch<C, N>(
        &self,
        catalog: &CheckCatalog,
        tokens: Vec<TokenDescriptor>,
        classify: C,
        normalize: N,
    ) -> Report
    where
        C: Fn(&TokenDescriptor) -> Result<SuiteResult, ClassifierError> + Sync,
        N: Fn(&SuiteResult, &[String]) -> Result<BitVector, ClassifierError> + Sync,
    {
        let start = Instant::now();
        let mut aggregator = ResultAggregator::new(catalog.names());

        if self.config.jobs > 1 {
            self.run_parallel(catalog, &tokens, &classify, &normalize, &mut aggregator);
        } else {
            self.run_sequential(catalog, &tokens, &classify, &normalize, &mut aggregator);
        }

        log::debug!(
            "Batch of {} token(s) finished in {}ms",
            tokens.len(),
            start.elapsed().as_millis()
        );
        aggregator.into_report()
    }

    /// Run tokens one after another
    fn run_sequential<C, N>(
        &self,
        catalog: &CheckCatalog,
        tokens: &[TokenDescriptor],
        classify: &C,
        normalize: &N,
        aggregator: &mut ResultAggregator,
    ) where
        C: Fn(&TokenDescriptor) -> Result<SuiteResult, ClassifierError> + Sync,
        N: Fn(&SuiteResult, &[String]) -> Result<BitVector, ClassifierError> + Sync,
    {
        for (i, token) in tokens.iter().enumerate() {
            log::info!("[{}/{}] Classifying {}", i + 1, tokens.len(), token);
            let outcome = self.process_token(token, catalog, classify, normalize);
            record(aggregator, token, outcome);
        }
    }

    /// Run tokens in batches of up to `jobs` scoped threads
    fn run_parallel<C, N>(
        &self,
        catalog: &CheckCatalog,
        tokens: &[TokenDescriptor],
        classify: &C,
        normalize: &N,
        aggregator: &mut ResultAggregator,
    ) where
        C: Fn(&TokenDescriptor) -> Result<SuiteResult, ClassifierError> + Sync,
        N: Fn(&SuiteResult, &[String]) -> Result<BitVector, ClassifierError> + Sync,
    {
        let mut done = 0;

        for batch in tokens.chunks(self.config.jobs) {
            for (i, token) in batch.iter().enumerate() {
                log::info!("[{}/{}] Classifying {}", done + i + 1, tokens.len(), token);
            }

            let outcomes: Vec<Result<ResultRow, ClassifierError>> = thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|token| {
                        s.spawn(move || self.process_token(token, catalog, classify, normalize))
                    })
                    .collect();

                // Joined in spawn order, so completion order never leaks into the report
                handles
                    .into_iter()
                    .zip(batch)
                    .map(|(handle, token)| {
                        handle
                            .join()
                            .unwrap_or_else(|_| Err(panicked(token)))
                    })
                    .collect()
            });

            for (token, outcome) in batch.iter().zip(outcomes) {
                record(aggregator, token, outcome);
            }
            done += batch.len();
        }
    }

    /// Classify and normalize one token
    fn process_token<C, N>(
        &self,
        token: &TokenDescriptor,
        catalog: &CheckCatalog,
        classify: &C,
        normalize: &N,
    ) -> Result<ResultRow, ClassifierError>
    where
        C: Fn(&TokenDescriptor) -> Result<SuiteResult, ClassifierError>,
        N: Fn(&SuiteResult, &[String]) -> Result<BitVector, ClassifierError>,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(|| classify(token)))
            .map_err(|_| panicked(token))??;

        let bits = normalize(&result, catalog.names())?;

        let token = match self.config.probes {
            Some(ref probes) => probes.apply(token, &result),
            None => token.clone(),
        };

        Ok(ResultRow { token, bits })
    }
}

impl Default for BatchOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

/// Sequential batch run with default settings
pub fn run_batch<C, N>(
    catalog: &CheckCatalog,
    tokens: Vec<TokenDescriptor>,
    classify: C,
    normalize: N,
) -> Report
where
    C: Fn(&TokenDescriptor) -> Result<SuiteResult, ClassifierError> + Sync,
    N: Fn(&SuiteResult, &[String]) -> Result<BitVector, ClassifierError> + Sync,
{
    BatchOrchestrator::default().run_batch(catalog, tokens, classify, normalize)
}

fn record(
    aggregator: &mut ResultAggregator,
    token: &TokenDescriptor,
    outcome: Result<ResultRow, ClassifierError>,
) {
    match outcome {
        Ok(row) => aggregator.add_row(row),
        Err(error) => aggregator.add_failure(token.clone(), error),
    }
}

fn panicked(token: &TokenDescriptor) -> ClassifierError {
    ClassifierError::ExecutionError {
        address: token.address.clone(),
        message: "classifier panicked".to_string(),
    }
}
