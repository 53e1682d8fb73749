//! Gate run orchestration: the tick/sleep loop and terminal reporting.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::aggregate::reduce;
use crate::check::{CheckObservation, CheckState, RunId, Verdict};
use crate::config::GateConfig;
use crate::error::Result;
use crate::poll::poll_once;
use crate::registry::CheckRegistry;
use crate::report::{CheckOutcome, GateReport, ResultReporter};
use crate::source::CheckStatusSource;

/// Resolves only on an actual cancellation signal.
///
/// A dropped sender or a `false` update must not resolve this future:
/// either would break out of the inter-tick sleep and turn the loop into a
/// busy poll of the status source.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        // Sender dropped: cancellation can never arrive.
        std::future::pending::<()>().await;
    }
}

/// How one gate run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// A terminal verdict was reached and published exactly once.
    Reported(GateReport),

    /// The run was aborted externally before any verdict. Nothing was
    /// published: an interrupted run has no verdict to report.
    Cancelled,
}

impl RunOutcome {
    /// The published report, if the run reached a verdict.
    pub fn report(&self) -> Option<&GateReport> {
        match self {
            RunOutcome::Reported(report) => Some(report),
            RunOutcome::Cancelled => None,
        }
    }
}

/// Orchestrates one gate run.
///
/// Owns the polling loop: each tick fetches every registered check, hands
/// the snapshot to the aggregator, and either stops on a terminal verdict
/// or sleeps until the next tick. The deadline is fixed at run start and
/// checked only while the verdict is still pending, so a success observed
/// on the final tick wins over a simultaneous deadline expiry.
///
/// `run` consumes the orchestrator, which is what makes the
/// exactly-once reporting guarantee structural: there is no orchestrator
/// left to poll or publish with after the terminal transition.
pub struct GateOrchestrator {
    run_id: RunId,
    registry: CheckRegistry,
    config: GateConfig,
    source: Arc<dyn CheckStatusSource>,
    reporter: Arc<dyn ResultReporter>,
}

impl std::fmt::Debug for GateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateOrchestrator")
            .field("run_id", &self.run_id)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GateOrchestrator {
    /// Create an orchestrator for one run.
    ///
    /// Validates the configuration and builds the check registry up front;
    /// no polling happens until [`GateOrchestrator::run`].
    pub fn new(
        config: GateConfig,
        source: Arc<dyn CheckStatusSource>,
        reporter: Arc<dyn ResultReporter>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = CheckRegistry::build(&config.checks)?;
        Ok(Self {
            run_id: RunId::new(),
            registry,
            config,
            source,
            reporter,
        })
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run to a terminal verdict without external cancellation.
    pub async fn run(self) -> Result<RunOutcome> {
        let (_tx, rx) = watch::channel(false);
        self.run_with_cancel(rx).await
    }

    /// Run to a terminal verdict, or stop early when `cancel` turns true.
    ///
    /// Cancellation stops future ticks and publishes nothing.
    pub async fn run_with_cancel(self, mut cancel: watch::Receiver<bool>) -> Result<RunOutcome> {
        let started_at = Utc::now();
        let started = Instant::now();
        let deadline = started + self.config.max_wait();

        info!(
            event = "gate.run_started",
            run_id = %self.run_id,
            checks = self.registry.len(),
            registry_digest = %self.registry.digest(),
            max_wait_secs = self.config.max_wait_secs,
            poll_interval_secs = self.config.poll_interval_secs,
        );

        let mut tick = 0u64;
        loop {
            if *cancel.borrow() {
                info!(event = "gate.run_cancelled", run_id = %self.run_id, tick = tick);
                return Ok(RunOutcome::Cancelled);
            }

            // One tick: fetch-all, then reduce. The snapshot replaces the
            // previous one wholesale (latest-wins per check).
            tick += 1;
            let latest = poll_once(
                self.registry.specs(),
                &self.source,
                self.config.fetch_timeout(),
            )
            .await;

            for observation in latest.values() {
                debug!(
                    event = "gate.check_observed",
                    run_id = %self.run_id,
                    check = %observation.name,
                    state = %observation.state,
                );
            }

            let verdict = reduce(self.registry.specs(), &latest);
            info!(
                event = "gate.tick",
                run_id = %self.run_id,
                tick = tick,
                verdict = %verdict,
            );

            match verdict {
                Verdict::Success | Verdict::Failure => {
                    return self.finish(verdict, started_at, started, &latest).await;
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return self
                    .finish(Verdict::Timeout, started_at, started, &latest)
                    .await;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = cancelled(&mut cancel) => {
                    info!(event = "gate.run_cancelled", run_id = %self.run_id, tick = tick);
                    return Ok(RunOutcome::Cancelled);
                }
            }
        }
    }

    /// Terminal transition: build the report and publish it.
    ///
    /// Consumes the orchestrator; no further polling is possible.
    async fn finish(
        self,
        verdict: Verdict,
        started_at: DateTime<Utc>,
        started: Instant,
        latest: &HashMap<String, CheckObservation>,
    ) -> Result<RunOutcome> {
        let checks = self
            .registry
            .specs()
            .iter()
            .map(|spec| CheckOutcome {
                name: spec.name.clone(),
                state: latest
                    .get(&spec.name)
                    .map(|obs| obs.state)
                    .unwrap_or(CheckState::NotFound),
            })
            .collect();

        let report = GateReport {
            run_id: self.run_id.clone(),
            verdict,
            registry_digest: self.registry.digest().to_string(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
            checks,
        };

        info!(
            event = "gate.run_finished",
            run_id = %self.run_id,
            verdict = %verdict,
            duration_ms = report.duration_ms,
            success = report.passed(),
        );

        self.reporter.publish(&report).await?;
        Ok(RunOutcome::Reported(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;
    use crate::fakes::{RecordingReporter, ScriptedStatusSource};

    fn config(checks: &[&str]) -> GateConfig {
        GateConfig::new(checks.iter().map(|s| s.to_string()).collect(), 60, 1, 1)
    }

    #[test]
    fn test_new_rejects_empty_check_set() {
        let source = Arc::new(ScriptedStatusSource::new());
        let reporter = Arc::new(RecordingReporter::new());
        let err = GateOrchestrator::new(config(&[]), source, reporter).unwrap_err();
        assert!(matches!(err, GateError::EmptyCheckSet));
    }

    #[test]
    fn test_new_rejects_zero_interval() {
        let source = Arc::new(ScriptedStatusSource::new());
        let reporter = Arc::new(RecordingReporter::new());
        let mut config = config(&["build"]);
        config.poll_interval_secs = 0;
        let err = GateOrchestrator::new(config, source, reporter).unwrap_err();
        assert!(matches!(err, GateError::NonPositiveDuration { .. }));
    }

    #[test]
    fn test_orchestrator_is_debuggable() {
        // Result combinators over Result<GateOrchestrator, _> need T: Debug.
        let source = Arc::new(ScriptedStatusSource::new());
        let reporter = Arc::new(RecordingReporter::new());
        let orchestrator = GateOrchestrator::new(config(&["build"]), source, reporter).unwrap();
        let rendered = format!("{orchestrator:?}");
        assert!(rendered.contains("GateOrchestrator"));
        assert!(rendered.contains(&orchestrator.run_id().0));
    }

    #[test]
    fn test_new_builds_registry_from_config() {
        let source = Arc::new(ScriptedStatusSource::new());
        let reporter = Arc::new(RecordingReporter::new());
        let orchestrator =
            GateOrchestrator::new(config(&["build", "scan", "build"]), source, reporter).unwrap();
        assert_eq!(orchestrator.registry().len(), 2);
    }
}
