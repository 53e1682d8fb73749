//! Verdict aggregation over a tick's observation snapshot.

use std::collections::HashMap;

use crate::check::{CheckObservation, CheckSpec, CheckState, Verdict};

/// Reduce one snapshot of per-check observations to a verdict.
///
/// Pure and deterministic; order-independent over the snapshot. Priority,
/// first match wins:
///
/// 1. Any required check observed as `Failure` fails the run immediately.
/// 2. Any required check unobserved, or observed as `NotFound`, `Pending`,
///    `InProgress`, or `Error`, keeps the run pending. `Error` is transient:
///    the next tick retries the fetch rather than escalating.
/// 3. Otherwise every required check succeeded.
///
/// Never returns [`Verdict::Timeout`]; the deadline is the orchestrator's
/// concern, not the snapshot's.
pub fn reduce(specs: &[CheckSpec], latest: &HashMap<String, CheckObservation>) -> Verdict {
    let mut waiting = false;

    for spec in specs.iter().filter(|s| s.required) {
        match latest.get(&spec.name).map(|obs| obs.state) {
            Some(CheckState::Failure) => return Verdict::Failure,
            Some(CheckState::Success) => {}
            Some(_) | None => waiting = true,
        }
    }

    if waiting {
        Verdict::Pending
    } else {
        Verdict::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckObservation;

    fn specs(names: &[&str]) -> Vec<CheckSpec> {
        names.iter().map(|n| CheckSpec::required(*n)).collect()
    }

    fn snapshot(entries: &[(&str, CheckState)]) -> HashMap<String, CheckObservation> {
        entries
            .iter()
            .map(|(name, state)| (name.to_string(), CheckObservation::now(*name, *state)))
            .collect()
    }

    #[test]
    fn test_all_success_is_success() {
        let specs = specs(&["build", "scan", "review"]);
        let latest = snapshot(&[
            ("build", CheckState::Success),
            ("scan", CheckState::Success),
            ("review", CheckState::Success),
        ]);
        assert_eq!(reduce(&specs, &latest), Verdict::Success);
    }

    #[test]
    fn test_never_success_unless_all_succeeded() {
        let specs = specs(&["build", "scan"]);
        for state in [
            CheckState::Pending,
            CheckState::InProgress,
            CheckState::Error,
            CheckState::NotFound,
        ] {
            let latest = snapshot(&[("build", CheckState::Success), ("scan", state)]);
            assert_eq!(reduce(&specs, &latest), Verdict::Pending, "state {state}");
        }
    }

    #[test]
    fn test_failure_wins_over_pending_and_error() {
        let specs = specs(&["build", "scan", "review"]);
        let latest = snapshot(&[
            ("build", CheckState::Pending),
            ("scan", CheckState::Failure),
            ("review", CheckState::Error),
        ]);
        assert_eq!(reduce(&specs, &latest), Verdict::Failure);
    }

    #[test]
    fn test_failure_wins_regardless_of_position() {
        // Order independence: the failing check may sit anywhere in the set.
        for failing in ["build", "scan", "review"] {
            let specs = specs(&["build", "scan", "review"]);
            let latest: HashMap<_, _> = specs
                .iter()
                .map(|s| {
                    let state = if s.name == failing {
                        CheckState::Failure
                    } else {
                        CheckState::Success
                    };
                    (s.name.clone(), CheckObservation::now(&s.name, state))
                })
                .collect();
            assert_eq!(reduce(&specs, &latest), Verdict::Failure);
        }
    }

    #[test]
    fn test_missing_observation_is_pending() {
        let specs = specs(&["build", "scan"]);
        let latest = snapshot(&[("build", CheckState::Success)]);
        assert_eq!(reduce(&specs, &latest), Verdict::Pending);
    }

    #[test]
    fn test_error_is_pending_not_failure() {
        let specs = specs(&["build"]);
        let latest = snapshot(&[("build", CheckState::Error)]);
        assert_eq!(reduce(&specs, &latest), Verdict::Pending);
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let specs = specs(&["build", "scan"]);
        let latest = snapshot(&[
            ("build", CheckState::Success),
            ("scan", CheckState::InProgress),
        ]);
        assert_eq!(reduce(&specs, &latest), reduce(&specs, &latest));
    }

    #[test]
    fn test_extra_observations_are_ignored() {
        // Snapshot entries for unregistered checks do not gate the verdict.
        let specs = specs(&["build"]);
        let latest = snapshot(&[
            ("build", CheckState::Success),
            ("stray", CheckState::Failure),
        ]);
        assert_eq!(reduce(&specs, &latest), Verdict::Success);
    }
}
