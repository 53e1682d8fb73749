//! mergegate core - merge gating via status aggregation
//!
//! Provides the status-aggregation and wait engine that:
//! - Polls an external check-reporting system for every required check
//! - Reduces each tick's snapshot to a single verdict
//! - Stops on success, failure, timeout, or external cancellation
//! - Publishes the terminal verdict exactly once

pub mod aggregate;
pub mod check;
pub mod config;
pub mod error;
pub mod fakes;
pub mod github;
pub mod orchestrate;
pub mod poll;
pub mod registry;
pub mod report;
pub mod source;

// Re-export key types
pub use aggregate::reduce;
pub use check::{CheckObservation, CheckSpec, CheckState, RunId, Verdict};
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use github::{CommitStatusReporter, CommitStatusSource};
pub use orchestrate::{GateOrchestrator, RunOutcome};
pub use poll::poll_once;
pub use registry::CheckRegistry;
pub use report::{CheckOutcome, GateReport, LogReporter, ResultReporter};
pub use source::CheckStatusSource;
