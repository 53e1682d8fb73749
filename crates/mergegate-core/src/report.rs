//! Final gate report and outward result publishing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::check::{CheckState, RunId, Verdict};
use crate::error::Result;

/// Final state of one check as it stood when the run terminated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub state: CheckState,
}

/// The terminal report for one gate run.
///
/// Machine-readable (serialized as the run's JSON artifact) and the input
/// to every [`ResultReporter`]. Always names every registered check and its
/// last-known state so a reader can see which check blocked the gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateReport {
    pub run_id: RunId,

    /// Terminal verdict: success, failure, or timeout.
    pub verdict: Verdict,

    /// Digest of the ordered check-name list this run gated on.
    pub registry_digest: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Per-check breakdown in registry order. Checks never observed are
    /// reported as `not_found`.
    pub checks: Vec<CheckOutcome>,
}

impl GateReport {
    /// Whether the gate allows the change to merge.
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Success
    }

    /// Number of checks whose final state is `success`.
    pub fn succeeded_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.state == CheckState::Success)
            .count()
    }

    /// Checks that did not finish with `success`, in registry order.
    pub fn blocking_checks(&self) -> Vec<&CheckOutcome> {
        self.checks
            .iter()
            .filter(|c| c.state != CheckState::Success)
            .collect()
    }

    /// One-line summary for statuses and logs.
    pub fn summary_line(&self) -> String {
        match self.verdict {
            Verdict::Success => format!("all {} required checks passed", self.checks.len()),
            Verdict::Failure => {
                let failed: Vec<&str> = self
                    .checks
                    .iter()
                    .filter(|c| c.state == CheckState::Failure)
                    .map(|c| c.name.as_str())
                    .collect();
                format!("required check(s) failed: {}", failed.join(", "))
            }
            Verdict::Timeout => format!(
                "timed out with {}/{} checks passed",
                self.succeeded_count(),
                self.checks.len()
            ),
            Verdict::Pending => "pending".to_string(),
        }
    }

    /// Render the report as a Markdown summary suitable for a PR comment.
    pub fn render_markdown(&self) -> String {
        let mut md = format!("# Merge Gate: {}\n\n", self.verdict);
        md.push_str(&format!("{}\n\n", self.summary_line()));
        md.push_str("| Check | State |\n|-------|-------|\n");
        for check in &self.checks {
            md.push_str(&format!("| `{}` | {} |\n", check.name, check.state));
        }
        md.push_str(&format!(
            "\n_run `{}` · {} ms_\n",
            self.run_id, self.duration_ms
        ));
        md
    }
}

/// Publishes the terminal verdict to an outward status surface.
///
/// The orchestrator guarantees at most one `publish` call per run.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    async fn publish(&self, report: &GateReport) -> Result<()>;
}

/// Reporter that emits the result as structured log events only.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResultReporter for LogReporter {
    async fn publish(&self, report: &GateReport) -> Result<()> {
        for check in &report.checks {
            info!(
                event = "gate.check_final",
                run_id = %report.run_id,
                check = %check.name,
                state = %check.state,
            );
        }
        match report.verdict {
            Verdict::Success => info!(
                event = "gate.reported",
                run_id = %report.run_id,
                verdict = %report.verdict,
                summary = %report.summary_line(),
            ),
            _ => error!(
                event = "gate.reported",
                run_id = %report.run_id,
                verdict = %report.verdict,
                summary = %report.summary_line(),
            ),
        }
        Ok(())
    }
}
