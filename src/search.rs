//! Finding a concept by name

use serde::Serialize;

/// Most partial matches returned for one query
pub const MAX_PARTIAL_MATCHES: usize = 50;

/// What a query matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SearchMatch {
    /// The concept whose name equals the query, ignoring case
    Exact(usize),
    /// Concepts whose names contain the query; at most 50, `total` counts all
    Partial { matches: Vec<usize>, total: usize },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// The query actually searched for
    pub query: String,
    /// Whether the query was cut to the maximum length
    pub truncated: bool,
    pub result: SearchMatch,
}

impl SearchOutcome {
    /// Whether some partial matches were left out
    pub fn capped(&self) -> bool {
        matches!(&self.result, SearchMatch::Partial { matches, total } if *total > matches.len())
    }
}

/// Look a query up among concept names.
///
/// The query is trimmed and cut to `max_len` characters. An exact match
/// (ignoring case) wins; otherwise every name containing the query is a
/// partial match, in concept order. An empty query matches nothing.
pub fn search_concepts<S: AsRef<str>>(query: &str, concepts: &[S], max_len: usize) -> SearchOutcome {
    let trimmed = query.trim();
    let truncated = trimmed.chars().count() > max_len;
    let query: String = trimmed.chars().take(max_len).collect();

    let result = if query.is_empty() {
        SearchMatch::NotFound
    } else {
        let needle = query.to_lowercase();
        let lowered: Vec<String> = concepts.iter().map(|c| c.as_ref().to_lowercase()).collect();

        if let Some(index) = lowered.iter().position(|c| *c == needle) {
            SearchMatch::Exact(index)
        } else {
            let all: Vec<usize> = lowered
                .iter()
                .enumerate()
                .filter(|(_, c)| c.contains(&needle))
                .map(|(i, _)| i)
                .collect();
            if all.is_empty() {
                SearchMatch::NotFound
            } else {
                let total = all.len();
                let mut matches = all;
                matches.truncate(MAX_PARTIAL_MATCHES);
                SearchMatch::Partial { matches, total }
            }
        }
    };

    SearchOutcome {
        query,
        truncated,
        result,
    }
}
