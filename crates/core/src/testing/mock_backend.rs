//! Mock backend for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::search::{Backend, BackendError, TorrentRecord};

/// Mock implementation of the Backend trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable records
/// - Track search queries for assertions
/// - Simulate failures, delays and panics
///
/// # Example
///
/// ```rust,ignore
/// use torrsearch_core::testing::{MockBackend, fixtures};
///
/// let backend = MockBackend::new("rutor");
/// backend.set_records(vec![
///     fixtures::record("Movie 2017 1080p", "aaaa...", Some(10)),
/// ]).await;
///
/// let records = backend.search("movie").await?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(backend.recorded_queries().await, vec!["movie"]);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    /// Configured records to return.
    records: Arc<RwLock<Vec<TorrentRecord>>>,
    /// Recorded search queries.
    queries: Arc<RwLock<Vec<String>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<BackendError>>>,
    /// Simulated latency before answering.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Panic instead of answering.
    panic: Arc<RwLock<bool>>,
}

impl MockBackend {
    /// Create a new mock backend with no records.
    pub fn new(name: &str) -> Self {
        Self::with_records(name, Vec::new())
    }

    /// Create a mock backend with predefined records.
    pub fn with_records(name: &str, records: Vec<TorrentRecord>) -> Self {
        Self {
            name: name.to_string(),
            records: Arc::new(RwLock::new(records)),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            panic: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the records to return for subsequent searches.
    pub async fn set_records(&self, records: Vec<TorrentRecord>) {
        *self.records.write().await = records;
    }

    /// Add a single record.
    pub async fn add_record(&self, record: TorrentRecord) {
        self.records.write().await.push(record);
    }

    /// Get recorded search queries.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: BackendError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every answer by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Make every search panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, BackendError> {
        self.queries.write().await.push(query.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.panic.read().await {
            panic!("mock backend {} panicked", self.name);
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.records.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_returns_configured_records() {
        let backend = MockBackend::new("mock");
        backend
            .set_records(vec![fixtures::record("A", &"a".repeat(40), Some(1))])
            .await;
        backend
            .add_record(fixtures::record("B", &"b".repeat(40), None))
            .await;

        let records = backend.search("query").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(backend.recorded_queries().await, vec!["query"]);
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let backend = MockBackend::new("mock");
        backend.set_next_error(BackendError::Timeout).await;

        assert!(matches!(
            backend.search("q").await,
            Err(BackendError::Timeout)
        ));
        assert!(backend.search("q").await.is_ok());
        assert_eq!(backend.search_count().await, 2);
    }

    #[test]
    fn test_with_records_outside_runtime() {
        let backend = MockBackend::with_records(
            "prebuilt",
            vec![fixtures::record("C", &"c".repeat(40), Some(4))],
        );

        let records = tokio_test::block_on(backend.search("c")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(backend.name(), "prebuilt");
    }
}
