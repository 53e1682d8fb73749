//! Read-only gateway to the external status-reporting system.

use async_trait::async_trait;

use crate::check::CheckObservation;
use crate::error::Result;

/// A read-only view of the external check-reporting system.
///
/// Implementations must be idempotent and side-effect-free from the
/// orchestrator's point of view: fetching a state never changes it.
///
/// A fetch that cannot reach the backing system should return `Err`; the
/// polling loop maps that to an `Error` observation for the single affected
/// check on that tick, so one flaky read never aborts the run.
#[async_trait]
pub trait CheckStatusSource: Send + Sync {
    /// Fetch the current state of the named check.
    ///
    /// Returns a `NotFound` observation if the check has not reported to
    /// the status system at all (distinct from `Pending`, which means the
    /// check is known but unfinished).
    async fn fetch(&self, name: &str) -> Result<CheckObservation>;
}
