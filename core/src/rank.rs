//! Relevance ranking over the positional index.
//!
//! For a candidate page `p` (a page holding at least one query term):
//!
//! * raw frequency `f(p) = Σ count(t, p) / sqrt(len(p))` over the query terms,
//!   duplicates included, so a repeated term counts again;
//! * raw location `l(p) = 1 / (1 + earliest position of any query term in p)`.
//!
//! Both are scaled by their maximum over the candidates into `(0, 1]` and
//! combined as `score = FREQ_WEIGHT * freqScore + LOC_WEIGHT * locScore`.
//! Results are ordered by score, descending, ties broken by page id.

use crate::tokenizer::query_terms;
use crate::{InvertedIndex, PageId, SearchError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const FREQ_WEIGHT: f64 = 1.0;
pub const LOC_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub name: PageId,
    pub score: f64,
    pub freq_score: f64,
    pub loc_score: f64,
}

/// Lowercase and trim a raw query, rejecting one with no terms.
pub fn normalize_query(raw: &str) -> Result<String, SearchError> {
    let q = raw.trim().to_lowercase();
    if q.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    Ok(q)
}

struct Candidate {
    count: usize,
    earliest: u32,
}

/// Rank every page matching at least one query term.
pub fn rank(query: &str, index: &InvertedIndex) -> Vec<SearchResult> {
    let terms = query_terms(query);
    let mut candidates: BTreeMap<&PageId, Candidate> = BTreeMap::new();
    for term in &terms {
        for posting in index.postings(term) {
            let Some(first) = posting.first() else { continue };
            let c = candidates.entry(&posting.page).or_insert(Candidate { count: 0, earliest: u32::MAX });
            c.count += posting.count();
            c.earliest = c.earliest.min(first);
        }
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let raw: Vec<(&PageId, f64, f64)> = candidates
        .into_iter()
        .map(|(page, c)| {
            let len = index.doc_length(page).max(1) as f64;
            let freq = c.count as f64 / len.sqrt();
            let loc = 1.0 / (1.0 + c.earliest as f64);
            (page, freq, loc)
        })
        .collect();

    let max_freq = raw.iter().map(|r| r.1).fold(0.0, f64::max);
    let max_loc = raw.iter().map(|r| r.2).fold(0.0, f64::max);

    let mut results: Vec<SearchResult> = raw
        .into_iter()
        .map(|(page, freq, loc)| {
            let freq_score = scale(freq, max_freq);
            let loc_score = scale(loc, max_loc);
            SearchResult {
                name: page.clone(),
                score: FREQ_WEIGHT * freq_score + LOC_WEIGHT * loc_score,
                freq_score,
                loc_score,
            }
        })
        .collect();

    results.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    results
}

fn scale(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}
