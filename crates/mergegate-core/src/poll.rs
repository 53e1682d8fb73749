//! One polling tick: concurrent fan-out fetch of every registered check.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use crate::check::{CheckObservation, CheckSpec, CheckState};
use crate::source::CheckStatusSource;

/// Fetch the current state of every registered check once.
///
/// Fetches are issued concurrently so tick latency tracks the slowest
/// single check, not the sum. Each fetch is bounded by `fetch_timeout`;
/// a hang or a fetch error becomes an `Error` observation for that check
/// alone, never a tick failure.
///
/// The returned map is keyed by spec name and is handed to the aggregator
/// as one atomic snapshot.
pub async fn poll_once(
    specs: &[CheckSpec],
    source: &Arc<dyn CheckStatusSource>,
    fetch_timeout: Duration,
) -> HashMap<String, CheckObservation> {
    let fetches = specs.iter().map(|spec| {
        let source = Arc::clone(source);
        async move {
            let observation = match tokio::time::timeout(fetch_timeout, source.fetch(&spec.name))
                .await
            {
                Ok(Ok(mut obs)) => {
                    // Key observations by the registered name even if the
                    // source echoes a different one.
                    obs.name = spec.name.clone();
                    obs
                }
                Ok(Err(e)) => {
                    warn!(check = %spec.name, error = %e, "check fetch failed, retrying next tick");
                    CheckObservation::now(&spec.name, CheckState::Error)
                }
                Err(_) => {
                    warn!(
                        check = %spec.name,
                        timeout_secs = fetch_timeout.as_secs(),
                        "check fetch timed out, retrying next tick",
                    );
                    CheckObservation::now(&spec.name, CheckState::Error)
                }
            };
            (spec.name.clone(), observation)
        }
    });

    join_all(fetches).await.into_iter().collect()
}
