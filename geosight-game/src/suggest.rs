//! Ranked autocomplete over catalog city names.
use crate::catalog::CityCatalog;

/// Inputs shorter than this (after trimming) produce no suggestions.
pub const MIN_QUERY_LEN: usize = 2;
/// Hard cap on returned suggestions.
pub const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone)]
struct Entry {
    original: String,
    folded: String,
}

/// Search index with precomputed case-folded names, built once per catalog.
#[derive(Debug, Clone, Default)]
pub struct SuggestIndex {
    entries: Vec<Entry>,
}

impl SuggestIndex {
    #[must_use]
    pub fn new(catalog: &CityCatalog) -> Self {
        let entries = catalog
            .cities
            .iter()
            .map(|city| Entry {
                original: city.name.clone(),
                folded: city.name.to_lowercase(),
            })
            .collect();
        Self { entries }
    }

    /// Ranked substring search. Prefix matches sort before other matches;
    /// ties order lexicographically on the folded name. Output is truncated
    /// to `MAX_SUGGESTIONS`.
    #[must_use]
    pub fn query(&self, input: &str) -> Vec<&str> {
        let needle = input.trim().to_lowercase();
        if needle.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let mut hits: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|entry| entry.folded.contains(&needle))
            .collect();
        hits.sort_by(|a, b| {
            let a_prefix = a.folded.starts_with(&needle);
            let b_prefix = b.folded.starts_with(&needle);
            b_prefix
                .cmp(&a_prefix)
                .then_with(|| a.folded.cmp(&b.folded))
        });
        hits.into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|entry| entry.original.as_str())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
