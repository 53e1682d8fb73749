//! Gate run configuration and validation.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// Configuration for one gate run.
///
/// Consumed at run start; all durations must be positive. The fetch timeout
/// should be shorter than the poll interval so a hung fetch never bleeds
/// into the next tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    /// Ordered list of required check names.
    pub checks: Vec<String>,

    /// Maximum total wait before the run times out, in seconds.
    pub max_wait_secs: u64,

    /// Sleep between polling ticks, in seconds.
    pub poll_interval_secs: u64,

    /// Per-check fetch timeout within a tick, in seconds.
    pub fetch_timeout_secs: u64,
}

impl GateConfig {
    /// Create a configuration; call [`GateConfig::validate`] before use.
    pub fn new(
        checks: Vec<String>,
        max_wait_secs: u64,
        poll_interval_secs: u64,
        fetch_timeout_secs: u64,
    ) -> Self {
        Self {
            checks,
            max_wait_secs,
            poll_interval_secs,
            fetch_timeout_secs,
        }
    }

    /// Validate durations and the check list.
    ///
    /// Fails before any polling starts: a zero duration or an empty check
    /// list has no meaningful gate semantics.
    pub fn validate(&self) -> Result<()> {
        if self.checks.is_empty() {
            return Err(GateError::EmptyCheckSet);
        }
        if self.max_wait_secs == 0 {
            return Err(GateError::NonPositiveDuration {
                field: "max_wait_secs",
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(GateError::NonPositiveDuration {
                field: "poll_interval_secs",
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(GateError::NonPositiveDuration {
                field: "fetch_timeout_secs",
            });
        }
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
