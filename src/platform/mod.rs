//! Platform abstraction layer.
//!
//! Provides the interface to the external contract-test engine:
//! - Suite identification and per-token execution context
//! - The `TestEngine` seam used by the pipeline
//! - The `forge` process implementation

pub mod forge;
