//! Check identity, per-check states, and run-level verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The state of one verification check as last reported by the status source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// The check is known to the status source but has not started.
    Pending,

    /// The check is currently executing.
    InProgress,

    /// The check finished and passed.
    Success,

    /// The check finished and rejected the change.
    Failure,

    /// The last fetch for this check failed (network blip, rate limit,
    /// hung call). Retried on the next tick, never escalated by itself.
    Error,

    /// The check has not reported to the status source at all.
    NotFound,
}

impl CheckState {
    /// Whether this state is a definitive outcome for the check.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckState::Success | CheckState::Failure)
    }

    /// Stable lowercase name, used in logs and rendered reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckState::Pending => "pending",
            CheckState::InProgress => "in_progress",
            CheckState::Success => "success",
            CheckState::Failure => "failure",
            CheckState::Error => "error",
            CheckState::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured check that gates the run.
///
/// Built once by the registry at run start and immutable for the run's
/// lifetime. Every configured check is required today; `required` is the
/// documented extension point for an optional tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSpec {
    /// Unique check name within a run (case-sensitive).
    pub name: String,

    /// Whether this check gates the verdict.
    pub required: bool,
}

impl CheckSpec {
    /// Create a required check spec.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }
}

/// The most recently fetched state of one check.
///
/// Produced fresh each poll tick; only the latest value per name is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckObservation {
    /// Check name this observation belongs to.
    pub name: String,

    /// State reported by the status source (or `Error` if the fetch failed).
    pub state: CheckState,

    /// When the orchestrator observed this state.
    pub observed_at: DateTime<Utc>,
}

impl CheckObservation {
    /// Create an observation timestamped now.
    pub fn now(name: impl Into<String>, state: CheckState) -> Self {
        Self {
            name: name.into(),
            state,
            observed_at: Utc::now(),
        }
    }
}

/// Aggregate decision over the whole check set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// At least one required check has no definitive outcome yet.
    Pending,

    /// Every required check succeeded.
    Success,

    /// At least one required check failed.
    Failure,

    /// The wait budget elapsed while the verdict was still pending.
    Timeout,
}

impl Verdict {
    /// Whether this verdict ends the run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending)
    }

    /// Stable lowercase name, used in logs and rendered reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pending => "pending",
            Verdict::Success => "success",
            Verdict::Failure => "failure",
            Verdict::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for one gate run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a fresh run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
