//! Torrent search aggregation.
//!
//! Backends are queried concurrently, their listings are merged by info hash,
//! filtered against the query and user filters, then ranked for display.

mod coordinator;
mod filter;
mod magnet;
mod merge;
mod rank;
mod types;

pub use coordinator::{FanOut, SearchCoordinator, SearchOptions, SearchReport};
pub use filter::{apply_filters, FilterSet};
pub use magnet::{parse_magnet, InfoHash, Magnet, MagnetError};
pub use merge::{merge_records, UnresolvedPolicy};
pub use rank::{parse_size_gb, rank, size_bucket, SizeTiebreak, UNPARSABLE_BUCKET};
pub use types::*;
