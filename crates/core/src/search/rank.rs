//! Result ordering: coarse size bucket first, then seeders.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::MergedRecord;

/// Bucket for sizes that could not be parsed.
pub const UNPARSABLE_BUCKET: u8 = 6;

/// Tie-break used inside a bucket when neither record reports seeders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTiebreak {
    /// Compare parsed gigabytes, larger first.
    #[default]
    Numeric,
    /// Compare raw size text, descending. "9 GB" sorts above "10 GB".
    Lexicographic,
}

/// (suffix, multiplier to gigabytes), longest suffixes first.
const UNITS: &[(&str, f64)] = &[
    ("GB", 1.0),
    ("ГБ", 1.0),
    ("TB", 1024.0),
    ("ТБ", 1024.0),
    ("MB", 1.0 / 1024.0),
    ("МБ", 1.0 / 1024.0),
];

/// Parse a size string such as `"12.3 GB"` or `"1,5 ГБ"` into gigabytes.
pub fn parse_size_gb(size: &str) -> Option<f64> {
    let size = size.trim();
    UNITS.iter().find_map(|(suffix, factor)| {
        let number = size.strip_suffix(suffix)?.trim().replace(',', ".");
        number.parse::<f64>().ok().map(|n| n * factor)
    })
}

/// Size bucket: 0 for the largest releases, 5 for the smallest, 6 when the
/// size text cannot be parsed.
pub fn size_bucket(size: &str) -> u8 {
    match parse_size_gb(size) {
        Some(gb) if gb > 50.0 => 0,
        Some(gb) if gb > 30.0 => 1,
        Some(gb) if gb > 15.0 => 2,
        Some(gb) if gb > 5.0 => 3,
        Some(gb) if gb > 1.0 => 4,
        Some(_) => 5,
        None => UNPARSABLE_BUCKET,
    }
}

fn compare(a: &MergedRecord, b: &MergedRecord, tiebreak: SizeTiebreak) -> Ordering {
    size_bucket(&a.size)
        .cmp(&size_bucket(&b.size))
        .then_with(|| match (a.seeders, b.seeders) {
            (None, None) => compare_size_desc(&a.size, &b.size, tiebreak),
            // None < Some(_), so unknown seeders sink below any known count
            (sa, sb) => sb.cmp(&sa),
        })
}

fn compare_size_desc(a: &str, b: &str, tiebreak: SizeTiebreak) -> Ordering {
    if tiebreak == SizeTiebreak::Numeric {
        if let (Some(ga), Some(gb)) = (parse_size_gb(a), parse_size_gb(b)) {
            return gb.total_cmp(&ga);
        }
    }
    b.cmp(a)
}

/// Sort results in display order. The sort is stable, so records equal under
/// the ranking key keep their arrival order.
pub fn rank(records: &mut [MergedRecord], tiebreak: SizeTiebreak) {
    records.sort_by(|a, b| compare(a, b, tiebreak));
}
