//! Types for the torrent search system.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A single listing as returned by one backend (before merging).
///
/// Peer counts are `None` when the source does not report them. On the JSON
/// wire an unknown count is written as `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Display title as reported by the source.
    #[serde(rename = "Name")]
    pub name: String,
    /// Magnet URI, or a link the backend resolved to one.
    #[serde(rename = "Magnet")]
    pub magnet: String,
    /// Human-readable size ("12.3 GB", "12.3 ГБ").
    #[serde(rename = "Size")]
    pub size: String,
    /// Seeders reported by the source.
    #[serde(rename = "PeersUl", with = "peer_count")]
    pub seeders: Option<u32>,
    /// Leechers reported by the source.
    #[serde(rename = "PeersDl", with = "peer_count")]
    pub leechers: Option<u32>,
}

/// One info-hash's consolidated view across every backend that listed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Best-known display name (longest non-empty name in the group).
    #[serde(rename = "Name")]
    pub name: String,
    /// Magnet URI re-serialized with the unioned tracker list.
    #[serde(rename = "Magnet")]
    pub magnet: String,
    /// Size text of the first member that reported one.
    #[serde(rename = "Size")]
    pub size: String,
    /// Maximum seeders observed in the group.
    #[serde(rename = "PeersUl", with = "peer_count")]
    pub seeders: Option<u32>,
    /// Maximum leechers observed in the group.
    #[serde(rename = "PeersDl", with = "peer_count")]
    pub leechers: Option<u32>,
    /// Info hash (lowercase hex). Empty string if the link never resolved.
    #[serde(skip)]
    pub info_hash: String,
    /// Deduplicated announce URLs, first-seen order.
    #[serde(skip)]
    pub trackers: Vec<String>,
}

impl MergedRecord {
    /// View this merged record as a raw record of its own identity.
    pub fn to_record(&self) -> TorrentRecord {
        TorrentRecord {
            name: self.name.clone(),
            magnet: self.magnet.clone(),
            size: self.size.clone(),
            seeders: self.seeders,
            leechers: self.leechers,
        }
    }
}

/// Errors a backend can report for one search call.
///
/// None of these escape the coordinator: a failing backend simply
/// contributes zero records.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Http(e.to_string())
        }
    }
}

/// Trait for torrent index backends.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logging and metrics.
    fn name(&self) -> &str;

    /// Search this source for `query`.
    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, BackendError>;
}

/// Serde adapter mapping `Option<u32>` to the `-1` sentinel used on the wire.
pub mod peer_count {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => s.serialize_i64(i64::from(*n)),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let n = i64::deserialize(d)?;
        Ok(u32::try_from(n).ok())
    }
}
