//! Merging of torrent records by info hash.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::magnet::{parse_magnet, Magnet};
use super::{MergedRecord, TorrentRecord};
use crate::metrics;

/// What to do with records whose link does not resolve to an info hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Discard them.
    #[default]
    Drop,
    /// Emit each one unmerged, with an empty `info_hash`.
    PassThrough,
}

/// Accumulator for one identity group.
struct Group {
    magnet: Magnet,
    seen_trackers: HashSet<String>,
    name: String,
    name_len: usize,
    size: String,
    seeders: Option<u32>,
    leechers: Option<u32>,
}

impl Group {
    fn new(record: TorrentRecord, magnet: Magnet) -> Self {
        let name_len = record.name.chars().count();
        let seen_trackers = magnet.trackers.iter().cloned().collect();
        Self {
            magnet,
            seen_trackers,
            name: record.name,
            name_len,
            size: record.size,
            seeders: record.seeders,
            leechers: record.leechers,
        }
    }

    fn absorb(&mut self, record: TorrentRecord, magnet: Magnet) {
        // Strictly longer wins, so ties keep the first-seen name
        let len = record.name.chars().count();
        if len > self.name_len {
            self.name = record.name;
            self.name_len = len;
        }
        if self.size.is_empty() {
            self.size = record.size;
        }
        if self.magnet.display_name.is_none() {
            self.magnet.display_name = magnet.display_name;
        }
        for tracker in magnet.trackers {
            if self.seen_trackers.insert(tracker.clone()) {
                self.magnet.trackers.push(tracker);
            }
        }
        self.seeders = self.seeders.max(record.seeders);
        self.leechers = self.leechers.max(record.leechers);
    }

    fn finish(self) -> MergedRecord {
        let mut magnet = self.magnet;
        let name = if self.name.is_empty() {
            magnet.display_name.clone().unwrap_or_default()
        } else {
            self.name
        };
        magnet.display_name = Some(name.clone());

        MergedRecord {
            magnet: magnet.to_uri(),
            info_hash: magnet.info_hash.to_hex(),
            trackers: magnet.trackers,
            name,
            size: self.size,
            seeders: self.seeders,
            leechers: self.leechers,
        }
    }
}

/// Merge raw records that share an info hash into one record per identity.
///
/// Groups are built in a single pass over a hash map. Output is in
/// first-seen order of each identity; unresolved records passed through by
/// `policy` follow the merged ones in arrival order.
pub fn merge_records(raw: Vec<TorrentRecord>, policy: UnresolvedPolicy) -> Vec<MergedRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut unresolved: Vec<MergedRecord> = Vec::new();

    for record in raw {
        let magnet = match parse_magnet(&record.magnet) {
            Ok(m) => m,
            Err(e) => {
                debug!(name = %record.name, error = %e, "Record link did not resolve to an info hash");
                metrics::UNRESOLVED_RECORDS.inc();
                if policy == UnresolvedPolicy::PassThrough {
                    unresolved.push(MergedRecord {
                        name: record.name,
                        magnet: record.magnet,
                        size: record.size,
                        seeders: record.seeders,
                        leechers: record.leechers,
                        info_hash: String::new(),
                        trackers: Vec::new(),
                    });
                }
                continue;
            }
        };

        let hash = magnet.info_hash.to_hex();
        match index.get(&hash) {
            Some(&i) => groups[i].absorb(record, magnet),
            None => {
                index.insert(hash, groups.len());
                groups.push(Group::new(record, magnet));
            }
        }
    }

    groups
        .into_iter()
        .map(Group::finish)
        .chain(unresolved)
        .collect()
}
