//! Matching of sub-zone grid rows against lookup keys.

use igr_core::normalize_key;
use serde::Serialize;

use crate::grid::GridRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub row: GridRow,
    /// The key as supplied, before normalization. Empty in scan-all mode.
    pub matched_key: String,
    pub confidence: MatchConfidence,
}

/// Normalized keys compared against one column of a grid.
#[derive(Debug, Clone)]
pub struct RowMatcher {
    keys: Vec<(String, String)>,
    column: usize,
}

impl RowMatcher {
    /// Keys that normalize to nothing are dropped; they would match every row.
    pub fn new<I, S>(keys: I, column: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<(String, String)> = Vec::new();
        for key in keys {
            let raw = key.as_ref();
            let norm = normalize_key(raw);
            if norm.is_empty() || normalized.iter().any(|(_, n)| *n == norm) {
                continue;
            }
            normalized.push((raw.to_owned(), norm));
        }
        Self {
            keys: normalized,
            column,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Candidates on one page, exact matches first, each group in row order.
    ///
    /// Only rows with a detail link are considered. A row is an exact match
    /// when its normalized label equals a key, and fuzzy when either contains
    /// the other.
    #[must_use]
    pub fn rank_candidates(&self, rows: &[GridRow]) -> Vec<MatchCandidate> {
        let labelled: Vec<(&GridRow, String)> = rows
            .iter()
            .filter(|row| row.has_detail_link)
            .filter_map(|row| {
                let label = normalize_key(row.column(self.column)?);
                (!label.is_empty()).then_some((row, label))
            })
            .collect();

        let mut candidates = Vec::new();
        let mut taken = vec![false; labelled.len()];

        for (i, (row, label)) in labelled.iter().enumerate() {
            if let Some((raw, _)) = self.keys.iter().find(|(_, key)| key == label) {
                taken[i] = true;
                candidates.push(MatchCandidate {
                    row: (*row).clone(),
                    matched_key: raw.clone(),
                    confidence: MatchConfidence::Exact,
                });
            }
        }

        for (i, (row, label)) in labelled.iter().enumerate() {
            if taken[i] {
                continue;
            }
            if let Some((raw, _)) = self
                .keys
                .iter()
                .find(|(_, key)| label.contains(key.as_str()) || key.contains(label.as_str()))
            {
                candidates.push(MatchCandidate {
                    row: (*row).clone(),
                    matched_key: raw.clone(),
                    confidence: MatchConfidence::Fuzzy,
                });
            }
        }

        candidates
    }

    /// The best candidate on the page, if any.
    #[must_use]
    pub fn find_match(&self, rows: &[GridRow]) -> Option<MatchCandidate> {
        self.rank_candidates(rows).into_iter().next()
    }
}

/// Every selectable row, in order, for exhaustive verification.
#[must_use]
pub fn scan_all_candidates(rows: &[GridRow]) -> Vec<MatchCandidate> {
    rows.iter()
        .filter(|row| row.has_detail_link)
        .map(|row| MatchCandidate {
            row: row.clone(),
            matched_key: String::new(),
            confidence: MatchConfidence::Fuzzy,
        })
        .collect()
}
