//! Concurrent fan-out across backends and the full search pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::metrics;

use super::filter::apply_filters;
use super::merge::{merge_records, UnresolvedPolicy};
use super::rank::{rank, SizeTiebreak};
use super::{Backend, BackendError, MergedRecord, TorrentRecord};

/// Tunables for one coordinator.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Applied to every backend independently. `None` leaves timing to the
    /// backend itself.
    pub backend_timeout: Option<Duration>,
    pub unresolved: UnresolvedPolicy,
    pub size_tiebreak: SizeTiebreak,
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            backend_timeout: Some(Duration::from_secs(config.backend_timeout_secs)),
            unresolved: config.unresolved,
            size_tiebreak: config.size_tiebreak,
        }
    }
}

/// Everything collected from one fan-out round.
#[derive(Debug, Default)]
pub struct FanOut {
    /// Records from every backend that succeeded, in backend order.
    pub records: Vec<TorrentRecord>,
    /// Backend name -> error message for every backend that failed.
    pub backend_errors: HashMap<String, String>,
}

/// Search result with metadata.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Ranked, filtered, merged results.
    pub results: Vec<MergedRecord>,
    /// Raw records collected before merging.
    pub raw_count: usize,
    /// Distinct identities after merging, before filtering.
    pub merged_count: usize,
    /// Any backends that failed (name -> error message).
    pub backend_errors: HashMap<String, String>,
    /// How long the search took in milliseconds.
    pub duration_ms: u64,
}

/// One backend's answer, tagged with its position in the backend list.
struct BackendBatch {
    index: usize,
    result: Result<Vec<TorrentRecord>, BackendError>,
}

/// Queries every backend concurrently and turns the combined listings into
/// one ranked, deduplicated result list.
pub struct SearchCoordinator {
    backends: Vec<Arc<dyn Backend>>,
    options: SearchOptions,
}

impl SearchCoordinator {
    pub fn new(backends: Vec<Arc<dyn Backend>>, options: SearchOptions) -> Self {
        Self { backends, options }
    }

    /// Names of the configured backends, in query order.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Run every backend for `query` and collect what they return.
    ///
    /// Each backend runs on its own task and reports through a channel; the
    /// call returns once every task has finished or timed out. Failures,
    /// timeouts and panics are logged and skipped.
    pub async fn fan_out(&self, query: &str) -> FanOut {
        let count = self.backends.len();
        let (tx, mut rx) = mpsc::channel::<BackendBatch>(count.max(1));

        let mut handles = Vec::with_capacity(count);
        for (index, backend) in self.backends.iter().enumerate() {
            let backend = Arc::clone(backend);
            let tx = tx.clone();
            let query = query.to_string();
            let limit = self.options.backend_timeout;

            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                let result = match limit {
                    Some(limit) => tokio::time::timeout(limit, backend.search(&query))
                        .await
                        .unwrap_or(Err(BackendError::Timeout)),
                    None => backend.search(&query).await,
                };

                let name = backend.name();
                metrics::BACKEND_DURATION
                    .with_label_values(&[name])
                    .observe(start.elapsed().as_secs_f64());
                let outcome = match &result {
                    Ok(records) => {
                        metrics::BACKEND_RECORDS
                            .with_label_values(&[name])
                            .inc_by(records.len() as u64);
                        debug!(
                            backend = name,
                            results = records.len(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Backend search complete"
                        );
                        "success"
                    }
                    Err(BackendError::Timeout) => "timeout",
                    Err(_) => "error",
                };
                metrics::BACKEND_SEARCHES
                    .with_label_values(&[name, outcome])
                    .inc();

                // Capacity covers one message per backend, so this never waits
                let _ = tx.send(BackendBatch { index, result }).await;
            }));
        }
        // The collector stops once every task has dropped its sender
        drop(tx);

        let mut batches: Vec<Option<Result<Vec<TorrentRecord>, BackendError>>> =
            (0..count).map(|_| None).collect();
        while let Some(batch) = rx.recv().await {
            batches[batch.index] = Some(batch.result);
        }

        let mut fan_out = FanOut::default();
        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                let name = self.backends[index].name();
                warn!(backend = name, error = %e, "Backend task did not complete");
                metrics::BACKEND_SEARCHES
                    .with_label_values(&[name, "panic"])
                    .inc();
                fan_out
                    .backend_errors
                    .insert(name.to_string(), format!("task failed: {}", e));
            }
        }

        for (index, batch) in batches.into_iter().enumerate() {
            let name = self.backends[index].name();
            match batch {
                Some(Ok(mut records)) => fan_out.records.append(&mut records),
                Some(Err(e)) => {
                    warn!(backend = name, error = %e, "Backend search failed");
                    fan_out.backend_errors.insert(name.to_string(), e.to_string());
                }
                // Task ended without reporting; already recorded above
                None => {}
            }
        }

        fan_out
    }

    /// Fan out, merge, filter and rank, keeping the per-backend report.
    pub async fn search<S: AsRef<str>>(&self, query: &str, filters: &[S]) -> SearchReport {
        let start = Instant::now();
        let query = query.trim();

        if query.is_empty() {
            return SearchReport {
                results: Vec::new(),
                raw_count: 0,
                merged_count: 0,
                backend_errors: HashMap::new(),
                duration_ms: 0,
            };
        }

        debug!(
            backends = ?self.backend_names(),
            query = %query,
            "Starting parallel search"
        );

        let FanOut {
            records,
            backend_errors,
        } = self.fan_out(query).await;
        let raw_count = records.len();

        if !self.backends.is_empty() && backend_errors.len() == self.backends.len() {
            warn!(query = %query, "All backends failed");
        }

        let merged = merge_records(records, self.options.unresolved);
        let merged_count = merged.len();

        let mut results = apply_filters(merged, filters, query);
        rank(&mut results, self.options.size_tiebreak);

        let elapsed = start.elapsed();
        metrics::SEARCH_RESULTS
            .with_label_values(&["raw"])
            .observe(raw_count as f64);
        metrics::SEARCH_RESULTS
            .with_label_values(&["merged"])
            .observe(merged_count as f64);
        metrics::SEARCH_RESULTS
            .with_label_values(&["filtered"])
            .observe(results.len() as f64);
        metrics::SEARCH_DURATION
            .with_label_values(&[])
            .observe(elapsed.as_secs_f64());

        info!(
            query = %query,
            raw = raw_count,
            merged = merged_count,
            results = results.len(),
            failed_backends = backend_errors.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Search complete"
        );

        SearchReport {
            results,
            raw_count,
            merged_count,
            backend_errors,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    /// Search every backend and return merged, filtered, ranked results.
    ///
    /// Never fails: backends that error or time out contribute nothing, and
    /// a total outage yields an empty list.
    pub async fn search_and_merge<S: AsRef<str>>(
        &self,
        query: &str,
        filters: &[S],
    ) -> Vec<MergedRecord> {
        self.search(query, filters).await.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockBackend};

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn coordinator(backends: Vec<Arc<MockBackend>>) -> SearchCoordinator {
        SearchCoordinator::new(
            backends
                .into_iter()
                .map(|b| b as Arc<dyn Backend>)
                .collect(),
            SearchOptions {
                backend_timeout: Some(Duration::from_millis(200)),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_fan_out_resilience() {
        let failing = Arc::new(MockBackend::new("failing"));
        failing
            .set_next_error(BackendError::Http("connection refused".to_string()))
            .await;
        let first = Arc::new(MockBackend::with_records(
            "first",
            vec![fixtures::record("Movie 2017 720p", HASH_A, Some(5))],
        ));
        let second = Arc::new(MockBackend::with_records(
            "second",
            vec![fixtures::record("Movie 2017 1080p", HASH_B, Some(9))],
        ));

        let coordinator = coordinator(vec![failing, first, second]);
        let results = coordinator.search_and_merge("movie", &[] as &[&str]).await;

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_backend_is_skipped() {
        let panicking = Arc::new(MockBackend::new("panicking"));
        panicking.set_panic(true).await;
        let healthy = Arc::new(MockBackend::with_records(
            "healthy",
            vec![fixtures::record("Movie", HASH_A, None)],
        ));

        let coordinator = coordinator(vec![panicking, healthy]);
        let report = coordinator.search("movie", &[] as &[&str]).await;

        assert_eq!(report.results.len(), 1);
        assert!(report.backend_errors.contains_key("panicking"));
    }

    #[tokio::test]
    async fn test_all_backends_failing_yields_empty() {
        let a = Arc::new(MockBackend::new("a"));
        a.set_next_error(BackendError::Timeout).await;
        let b = Arc::new(MockBackend::new("b"));
        b.set_next_error(BackendError::Parse("bad html".to_string()))
            .await;

        let coordinator = coordinator(vec![a, b]);
        let report = coordinator.search("movie", &[] as &[&str]).await;

        assert!(report.results.is_empty());
        assert_eq!(report.backend_errors.len(), 2);
    }

    #[tokio::test]
    async fn test_no_backends_yields_empty() {
        let coordinator = coordinator(vec![]);
        assert!(coordinator
            .search_and_merge("movie", &[] as &[&str])
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_independently() {
        let slow = Arc::new(MockBackend::with_records(
            "slow",
            vec![fixtures::record("Movie slow", HASH_A, None)],
        ));
        slow.set_delay(Duration::from_secs(5)).await;
        let fast = Arc::new(MockBackend::with_records(
            "fast",
            vec![fixtures::record("Movie fast", HASH_B, None)],
        ));

        let coordinator = coordinator(vec![slow, fast]);
        let start = Instant::now();
        let report = coordinator.search("movie", &[] as &[&str]).await;

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].name, "Movie fast");
        assert_eq!(report.backend_errors.get("slow").unwrap(), "Request timeout");
    }

    #[tokio::test]
    async fn test_merge_order_follows_backend_order() {
        // The later backend answers first, but the earlier one's name wins the tie
        let early = Arc::new(MockBackend::with_records(
            "early",
            vec![fixtures::record("Movie.A", HASH_A, None)],
        ));
        early.set_delay(Duration::from_millis(50)).await;
        let late = Arc::new(MockBackend::with_records(
            "late",
            vec![fixtures::record("Movie.B", HASH_A, None)],
        ));

        let coordinator = coordinator(vec![early, late]);
        let results = coordinator.search_and_merge("movie", &[] as &[&str]).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Movie.A");
    }

    #[tokio::test]
    async fn test_empty_query_skips_backends() {
        let backend = Arc::new(MockBackend::with_records(
            "mock",
            vec![fixtures::record("Movie", HASH_A, None)],
        ));
        let coordinator = coordinator(vec![Arc::clone(&backend)]);

        let results = coordinator.search_and_merge("   ", &[] as &[&str]).await;

        assert!(results.is_empty());
        assert_eq!(backend.search_count().await, 0);
    }

    #[tokio::test]
    async fn test_every_backend_receives_query() {
        let a = Arc::new(MockBackend::new("a"));
        let b = Arc::new(MockBackend::new("b"));
        let coordinator = coordinator(vec![Arc::clone(&a), Arc::clone(&b)]);

        coordinator.fan_out("matrix").await;

        assert_eq!(a.recorded_queries().await, vec!["matrix"]);
        assert_eq!(b.recorded_queries().await, vec!["matrix"]);
    }
}
