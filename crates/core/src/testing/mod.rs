//! Testing utilities and mock implementations.
//!
//! This module provides a mock `Backend` and record fixtures so the search
//! pipeline and the HTTP layer can be tested without reaching any tracker site.
//!
//! # Example
//!
//! ```rust,ignore
//! use torrsearch_core::testing::{MockBackend, fixtures};
//!
//! let backend = Arc::new(MockBackend::new("rutor"));
//! backend.set_records(vec![fixtures::record("Movie", HASH, Some(3))]).await;
//!
//! let coordinator = SearchCoordinator::new(vec![backend], SearchOptions::default());
//! ```

mod mock_backend;

pub use mock_backend::MockBackend;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::search::TorrentRecord;

    /// Create a record whose magnet carries `info_hash` and no trackers.
    pub fn record(name: &str, info_hash: &str, seeders: Option<u32>) -> TorrentRecord {
        TorrentRecord {
            name: name.to_string(),
            magnet: format!("magnet:?xt=urn:btih:{}", info_hash),
            size: "1.4 GB".to_string(),
            seeders,
            leechers: seeders.map(|s| s / 2),
        }
    }

    /// Create a record with an explicit size and tracker list.
    pub fn record_with(
        name: &str,
        info_hash: &str,
        size: &str,
        trackers: &[&str],
        seeders: Option<u32>,
    ) -> TorrentRecord {
        let mut magnet = format!("magnet:?xt=urn:btih:{}", info_hash);
        for tracker in trackers {
            magnet.push_str("&tr=");
            magnet.push_str(&urlencoding::encode(tracker));
        }
        TorrentRecord {
            name: name.to_string(),
            magnet,
            size: size.to_string(),
            seeders,
            leechers: None,
        }
    }

    /// Deterministic 40-char hex hash derived from `n`.
    pub fn hash(n: u32) -> String {
        format!("{:040x}", n)
    }
}
