//! In-memory fakes for gate traits (testing only)
//!
//! Provides `ScriptedStatusSource`, `FailingStatusSource`,
//! `HangingStatusSource`, and `RecordingReporter` that satisfy the trait
//! contracts without any external dependencies.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::check::{CheckObservation, CheckState};
use crate::error::{GateError, Result};
use crate::report::{GateReport, ResultReporter};
use crate::source::CheckStatusSource;

// ---------------------------------------------------------------------------
// ScriptedStatusSource
// ---------------------------------------------------------------------------

/// Status source that replays a scripted state sequence per check.
///
/// Each fetch consumes the next scripted state; the final state repeats
/// once the script is exhausted. Unscripted checks report `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedStatusSource {
    scripts: Mutex<HashMap<String, VecDeque<CheckState>>>,
    fetch_count: Mutex<usize>,
}

impl ScriptedStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the state sequence for one check.
    pub fn script(&self, name: &str, states: Vec<CheckState>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.insert(name.to_string(), states.into());
    }

    /// Total number of fetches issued against this source.
    pub fn fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }
}

#[async_trait]
impl CheckStatusSource for ScriptedStatusSource {
    async fn fetch(&self, name: &str) -> Result<CheckObservation> {
        *self.fetch_count.lock().unwrap() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let state = match scripts.get_mut(name) {
            Some(queue) => {
                if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().copied().unwrap_or(CheckState::NotFound)
                }
            }
            None => CheckState::NotFound,
        };
        Ok(CheckObservation::now(name, state))
    }
}

// ---------------------------------------------------------------------------
// FailingStatusSource
// ---------------------------------------------------------------------------

/// Status source whose fetch fails for one named check and succeeds for
/// every other.
#[derive(Debug)]
pub struct FailingStatusSource {
    failing_check: String,
}

impl FailingStatusSource {
    pub fn for_check(name: &str) -> Self {
        Self {
            failing_check: name.to_string(),
        }
    }
}

#[async_trait]
impl CheckStatusSource for FailingStatusSource {
    async fn fetch(&self, name: &str) -> Result<CheckObservation> {
        if name == self.failing_check {
            return Err(GateError::Source {
                check: name.to_string(),
                reason: "simulated transport failure".to_string(),
            });
        }
        Ok(CheckObservation::now(name, CheckState::Success))
    }
}

// ---------------------------------------------------------------------------
// HangingStatusSource
// ---------------------------------------------------------------------------

/// Status source whose fetch never completes. Exercises the per-check
/// fetch timeout.
#[derive(Debug)]
pub struct HangingStatusSource;

#[async_trait]
impl CheckStatusSource for HangingStatusSource {
    async fn fetch(&self, _name: &str) -> Result<CheckObservation> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records every published report in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    published: Mutex<Vec<GateReport>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publish calls seen.
    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    /// All published reports, in publish order.
    pub fn published(&self) -> Vec<GateReport> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultReporter for RecordingReporter {
    async fn publish(&self, report: &GateReport) -> Result<()> {
        self.published.lock().unwrap().push(report.clone());
        Ok(())
    }
}
