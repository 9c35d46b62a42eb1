//! Data module for erc20-classifier
//!
//! Contains the token corpus registry and loader.

pub mod corpus;
