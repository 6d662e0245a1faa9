//! Conformance testing harness for unithread.
//!
//! This crate provides:
//! - Scenario checks: each observable property of the threading façade
//!   exercised end-to-end through the public surface
//! - Report generation: human-readable text plus machine-readable JSON

#![forbid(unsafe_code)]

pub mod report;
pub mod scenario;

pub use report::{ConformanceReport, HarnessError, ScenarioOutcome};
pub use scenario::Scenario;
