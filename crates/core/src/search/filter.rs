//! Substring filters over merged result names.
//!
//! A filter set is an AND of expressions; each expression is an OR of
//! `|`-separated alternatives. Matching is case-insensitive substring
//! containment, nothing more.

use super::MergedRecord;

/// One expression: satisfied when the name contains any alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Expression {
    alternatives: Vec<String>,
}

impl Expression {
    /// Returns `None` for a blank expression, which filters nothing.
    ///
    /// Blank alternatives inside a non-blank expression are kept: the empty
    /// string is contained in every name, so `"720|"` matches everything.
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        if raw.is_empty() {
            return None;
        }
        let alternatives = raw.split('|').map(|a| a.trim().to_string()).collect();
        Some(Self { alternatives })
    }

    fn matches(&self, name: &str) -> bool {
        self.alternatives.iter().any(|a| name.contains(a.as_str()))
    }
}

/// Compiled set of filter expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    expressions: Vec<Expression>,
}

impl FilterSet {
    /// Compile user filters plus the search query, which always acts as one
    /// more expression.
    pub fn new<S: AsRef<str>>(filters: &[S], query: &str) -> Self {
        let expressions = filters
            .iter()
            .map(AsRef::as_ref)
            .chain(std::iter::once(query))
            .filter_map(Expression::parse)
            .collect();
        Self { expressions }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Whether `name` satisfies every expression.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.expressions.iter().all(|e| e.matches(&name))
    }
}

/// Keep only the records whose name passes the filters and the query.
pub fn apply_filters<S: AsRef<str>>(
    records: Vec<MergedRecord>,
    filters: &[S],
    query: &str,
) -> Vec<MergedRecord> {
    let set = FilterSet::new(filters, query);
    if set.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| set.matches(&r.name)).collect()
}
