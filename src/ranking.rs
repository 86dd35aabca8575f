//! # Result Merger/Ranker
//!
//! Folds the per-tier candidate lists into the response shape handed back per line.
//! Ranking across tiers is by tier priority only; raw scores never cross tiers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::matching::{MatchCandidate, MatchingConfig, TierKind, TierResults};
use crate::text_processing::ParsedLine;

/// Maximum number of entries in `suggestions`
pub const MAX_SUGGESTIONS: usize = 5;

/// Maximum number of entries in `combined`
pub const MAX_COMBINED: usize = 7;

/// Resolution outcome for one OCR line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Parsed form of the line
    pub parsed: ParsedLine,
    /// Catalog name equal to the parsed name, case-insensitively
    pub exact_match: Option<String>,
    /// Similarity-tier names (pattern-tier when similarity is empty), at most five
    pub suggestions: Vec<String>,
    /// Priority-ordered, deduplicated candidates, at most seven
    pub combined: Vec<String>,
    /// Name accepted for the cart, if any
    pub accepted_match: Option<String>,
    /// Tier that produced the accepted name
    pub accepted_tier: Option<TierKind>,
}

impl ResolutionResult {
    /// Whether this line produced a cart-worthy match
    pub fn is_accepted(&self) -> bool {
        self.accepted_match.is_some()
    }
}

/// Candidates in priority order, deduplicated case-insensitively, first occurrence wins
fn ranked_candidates(results: &TierResults) -> Vec<&MatchCandidate> {
    let mut seen = HashSet::new();

    results
        .exact
        .iter()
        .chain(results.tier(TierKind::Prefix))
        .chain(results.tier(TierKind::Similarity))
        .chain(results.tier(TierKind::Pattern))
        .chain(results.tier(TierKind::Phonetic))
        .filter(|candidate| seen.insert(candidate.catalog_name.to_lowercase()))
        .take(MAX_COMBINED)
        .collect()
}

/// Decide whether the top candidate may go into the cart
fn is_acceptable(candidate: &MatchCandidate, config: &MatchingConfig) -> bool {
    match candidate.tier {
        TierKind::Exact => true,
        TierKind::Prefix => candidate.score >= config.prefix_acceptance_min_len as f64,
        TierKind::Similarity => candidate.score >= config.similarity_threshold,
        TierKind::Pattern | TierKind::Phonetic => false,
    }
}

/// Merge tier outputs into a [`ResolutionResult`]
pub fn merge(parsed: ParsedLine, results: &TierResults, config: &MatchingConfig) -> ResolutionResult {
    let suggestion_source = if results.tier(TierKind::Similarity).is_empty() {
        results.tier(TierKind::Pattern)
    } else {
        results.tier(TierKind::Similarity)
    };
    let suggestions = suggestion_source
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|c| c.catalog_name.clone())
        .collect();

    let ranked = ranked_candidates(results);
    let combined = ranked.iter().map(|c| c.catalog_name.clone()).collect();

    let exact_match = results.exact.as_ref().map(|c| c.catalog_name.clone());
    let accepted = match &results.exact {
        Some(exact) => Some(exact),
        None => ranked
            .first()
            .copied()
            .filter(|top| is_acceptable(top, config)),
    };

    ResolutionResult {
        parsed,
        exact_match,
        suggestions,
        combined,
        accepted_match: accepted.map(|c| c.catalog_name.clone()),
        accepted_tier: accepted.map(|c| c.tier),
    }
}
