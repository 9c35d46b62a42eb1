//! Classification engine module.
//!
//! Provides per-token classification, result normalization, batch
//! orchestration and report aggregation.

pub mod classifier;
pub mod normalize;
pub mod orchestrator;
pub mod result;
