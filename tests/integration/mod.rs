//! Integration tests for erc20-classifier.
//!
//! These tests drive the full pipeline against a mock engine and corpus
//! files written to temporary directories.

pub mod cli_tests;
pub mod output_tests;
