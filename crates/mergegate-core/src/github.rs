//! GitHub-backed status source and reporter.
//!
//! Binds the abstract [`CheckStatusSource`] and [`ResultReporter`] seams to
//! the GitHub REST API: check runs are read per commit, and the aggregate
//! verdict is published back as a single commit status other tooling (for
//! example branch protection) can gate on.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::check::{CheckObservation, CheckState, Verdict};
use crate::error::{GateError, Result};
use crate::report::{GateReport, ResultReporter};
use crate::source::CheckStatusSource;

const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("mergegate/", env!("CARGO_PKG_VERSION"));

/// Maximum length GitHub accepts for a commit status description.
const MAX_DESCRIPTION_CHARS: usize = 140;

// ---------------------------------------------------------------------------
// Check-runs API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CheckRunList {
    check_runs: Vec<CheckRun>,
}

#[derive(Debug, Deserialize)]
struct CheckRun {
    status: String,
    conclusion: Option<String>,
}

/// Map a check run's status/conclusion pair to a gate check state.
///
/// Neutral and skipped conclusions count as success, matching how branch
/// protection treats them. Unknown values map to `Error` so the next tick
/// retries instead of the run wedging on a state we cannot interpret.
fn map_check_run(status: &str, conclusion: Option<&str>) -> CheckState {
    match status {
        "queued" => CheckState::Pending,
        "in_progress" => CheckState::InProgress,
        "completed" => match conclusion {
            Some("success") | Some("neutral") | Some("skipped") => CheckState::Success,
            Some("failure") | Some("cancelled") | Some("timed_out") | Some("action_required")
            | Some("stale") => CheckState::Failure,
            _ => CheckState::Error,
        },
        _ => CheckState::Error,
    }
}

/// Reduce a check-runs page to the state of the queried check.
///
/// An empty page means the check has not reported, whatever the server
/// claims elsewhere in the response.
fn state_from_list(list: &CheckRunList) -> CheckState {
    match list.check_runs.first() {
        None => CheckState::NotFound,
        Some(run) => map_check_run(&run.status, run.conclusion.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// CommitStatusSource
// ---------------------------------------------------------------------------

/// Reads per-check states from the GitHub check-runs API for one commit.
#[derive(Debug, Clone)]
pub struct CommitStatusSource {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    sha: String,
    token: Option<String>,
}

impl CommitStatusSource {
    /// Create a source for `repo` (as `owner/name`) at commit `sha`.
    pub fn new(repo: impl Into<String>, sha: impl Into<String>, token: Option<String>) -> Self {
        Self::with_api_url(DEFAULT_API_URL, repo, sha, token)
    }

    /// Create a source against a non-default API endpoint (GitHub
    /// Enterprise, or a local stub in tests).
    pub fn with_api_url(
        api_url: impl Into<String>,
        repo: impl Into<String>,
        sha: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            sha: sha.into(),
            token,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl CheckStatusSource for CommitStatusSource {
    async fn fetch(&self, name: &str) -> Result<CheckObservation> {
        let url = format!(
            "{}/repos/{}/commits/{}/check-runs",
            self.api_url, self.repo, self.sha
        );

        let source_err = |reason: String| GateError::Source {
            check: name.to_string(),
            reason,
        };

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("check_name", name), ("filter", "latest")])
            .send()
            .await
            .map_err(|e| source_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| source_err(e.to_string()))?;

        let list: CheckRunList = response
            .json()
            .await
            .map_err(|e| source_err(e.to_string()))?;

        Ok(CheckObservation::now(name, state_from_list(&list)))
    }
}

// ---------------------------------------------------------------------------
// CommitStatusReporter
// ---------------------------------------------------------------------------

/// Publishes the aggregate verdict as one GitHub commit status.
#[derive(Debug, Clone)]
pub struct CommitStatusReporter {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    sha: String,
    context: String,
    token: Option<String>,
}

impl CommitStatusReporter {
    /// Create a reporter publishing under the given status context.
    pub fn new(
        repo: impl Into<String>,
        sha: impl Into<String>,
        context: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self::with_api_url(DEFAULT_API_URL, repo, sha, context, token)
    }

    pub fn with_api_url(
        api_url: impl Into<String>,
        repo: impl Into<String>,
        sha: impl Into<String>,
        context: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            sha: sha.into(),
            context: context.into(),
            token,
        }
    }
}

/// Map a terminal verdict to a GitHub commit status state.
fn status_state(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Success => "success",
        Verdict::Failure => "failure",
        // Timeout is an operational condition, not a check rejection.
        Verdict::Timeout => "error",
        Verdict::Pending => "pending",
    }
}

fn truncate_description(summary: &str) -> String {
    summary.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

#[async_trait]
impl ResultReporter for CommitStatusReporter {
    async fn publish(&self, report: &GateReport) -> Result<()> {
        let url = format!("{}/repos/{}/statuses/{}", self.api_url, self.repo, self.sha);

        let body = json!({
            "state": status_state(report.verdict),
            "context": &self.context,
            "description": truncate_description(&report.summary_line()),
        });

        let request = self
            .client
            .post(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&body);
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        request
            .send()
            .await
            .map_err(|e| GateError::Publish(e.to_string()))?
            .error_for_status()
            .map_err(|e| GateError::Publish(e.to_string()))?;

        info!(
            event = "gate.status_published",
            run_id = %report.run_id,
            context = %self.context,
            state = status_state(report.verdict),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_queued_and_in_progress() {
        assert_eq!(map_check_run("queued", None), CheckState::Pending);
        assert_eq!(map_check_run("in_progress", None), CheckState::InProgress);
    }

    #[test]
    fn test_map_completed_conclusions() {
        assert_eq!(
            map_check_run("completed", Some("success")),
            CheckState::Success
        );
        assert_eq!(
            map_check_run("completed", Some("neutral")),
            CheckState::Success
        );
        assert_eq!(
            map_check_run("completed", Some("skipped")),
            CheckState::Success
        );
        assert_eq!(
            map_check_run("completed", Some("failure")),
            CheckState::Failure
        );
        assert_eq!(
            map_check_run("completed", Some("timed_out")),
            CheckState::Failure
        );
        assert_eq!(
            map_check_run("completed", Some("cancelled")),
            CheckState::Failure
        );
    }

    #[test]
    fn test_map_unknown_values_are_transient_errors() {
        assert_eq!(map_check_run("completed", None), CheckState::Error);
        assert_eq!(
            map_check_run("completed", Some("mystery")),
            CheckState::Error
        );
        assert_eq!(map_check_run("warped", None), CheckState::Error);
    }

    #[test]
    fn test_empty_check_run_page_is_not_found() {
        // Servers may report a nonzero count alongside an empty page; the
        // empty page wins and must not panic the fetch.
        let list: CheckRunList =
            serde_json::from_str(r#"{"total_count": 3, "check_runs": []}"#).unwrap();
        assert_eq!(state_from_list(&list), CheckState::NotFound);
    }

    #[test]
    fn test_single_run_page_maps_through() {
        let list: CheckRunList = serde_json::from_str(
            r#"{"total_count": 1, "check_runs": [{"status": "completed", "conclusion": "success"}]}"#,
        )
        .unwrap();
        assert_eq!(state_from_list(&list), CheckState::Success);
    }

    #[test]
    fn test_status_state_mapping() {
        assert_eq!(status_state(Verdict::Success), "success");
        assert_eq!(status_state(Verdict::Failure), "failure");
        assert_eq!(status_state(Verdict::Timeout), "error");
    }

    #[test]
    fn test_description_truncated_to_github_limit() {
        let long = "x".repeat(300);
        assert_eq!(truncate_description(&long).chars().count(), 140);
        assert_eq!(truncate_description("short"), "short");
    }
}
