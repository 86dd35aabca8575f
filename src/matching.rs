//! # Matching Pipeline
//!
//! Resolves one item name against a catalog snapshot through a cascade of tiers,
//! ordered from most precise to most permissive:
//!
//! | Tier       | Candidate rule                                  | Score                  |
//! |------------|-------------------------------------------------|------------------------|
//! | Exact      | match key equals the name                       | 100                    |
//! | Prefix     | key starts with the first word, then 3/2/1 chars | prefix length          |
//! | Similarity | Levenshtein ratio at or above threshold         | ratio 0-100            |
//! | Pattern    | shared character bigrams, top N, refined        | shared bigram count    |
//! | Phonetic   | equal Double Metaphone code, fallback only      | 100                    |
//!
//! Scores are only comparable inside a tier. Tiers are never merged by raw score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::catalog::{bigrams, Catalog};
use crate::errors::{AppError, AppResult};
use crate::observability;
use crate::phonetic::PhoneticMatcher;
use crate::text_processing::normalize;

/// Thresholds and limits for the matching tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum similarity ratio (0-100) for the similarity tier and for acceptance.
    /// Inclusive: a ratio equal to the threshold is kept.
    pub similarity_threshold: f64,
    /// Minimum similarity ratio (0-100) used to refine pattern-tier candidates
    pub pattern_refinement_threshold: f64,
    /// Whether the pattern tier re-filters its top candidates by similarity ratio
    pub enable_pattern_refinement: bool,
    /// How many pattern candidates are kept. The cap applies before refinement,
    /// and also when refinement is disabled.
    pub pattern_top_n: usize,
    /// Shortest prefix (in characters) that lets a prefix match be accepted into the cart
    pub prefix_acceptance_min_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 60.0,
            pattern_refinement_threshold: 50.0,
            enable_pattern_refinement: true,
            pattern_top_n: 10,
            prefix_acceptance_min_len: 3,
        }
    }
}

impl MatchingConfig {
    /// Validate matching configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(AppError::Config(format!(
                "similarity_threshold must be between 0 and 100, got {}",
                self.similarity_threshold
            )));
        }

        if !(0.0..=100.0).contains(&self.pattern_refinement_threshold) {
            return Err(AppError::Config(format!(
                "pattern_refinement_threshold must be between 0 and 100, got {}",
                self.pattern_refinement_threshold
            )));
        }

        if self.pattern_top_n == 0 {
            return Err(AppError::Config(
                "pattern_top_n must be greater than 0".to_string(),
            ));
        }

        if self.prefix_acceptance_min_len == 0 {
            return Err(AppError::Config(
                "prefix_acceptance_min_len must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// One strategy of the matching cascade, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Exact,
    Prefix,
    Similarity,
    Pattern,
    Phonetic,
}

impl TierKind {
    /// Every tier, highest priority first
    pub const CASCADE: [TierKind; 5] = [
        TierKind::Exact,
        TierKind::Prefix,
        TierKind::Similarity,
        TierKind::Pattern,
        TierKind::Phonetic,
    ];

    /// Stable lowercase label, used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Exact => "exact",
            TierKind::Prefix => "prefix",
            TierKind::Similarity => "similarity",
            TierKind::Pattern => "pattern",
            TierKind::Phonetic => "phonetic",
        }
    }

    /// Run this tier for a case-folded query
    pub fn run(self, query: &str, catalog: &Catalog, config: &MatchingConfig) -> Vec<MatchCandidate> {
        if query.is_empty() || catalog.is_empty() {
            return Vec::new();
        }

        match self {
            TierKind::Exact => exact_tier(query, catalog),
            TierKind::Prefix => prefix_tier(query, catalog),
            TierKind::Similarity => similarity_tier(query, catalog, config),
            TierKind::Pattern => pattern_tier(query, catalog, config),
            TierKind::Phonetic => phonetic_tier(query, catalog),
        }
    }
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog name proposed by one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Catalog name as stored
    pub catalog_name: String,
    /// Tier that produced the candidate
    pub tier: TierKind,
    /// Tier-local score
    pub score: f64,
}

impl MatchCandidate {
    fn new(catalog_name: &str, tier: TierKind, score: f64) -> Self {
        Self {
            catalog_name: catalog_name.to_string(),
            tier,
            score,
        }
    }
}

/// Output of the whole cascade for one name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierResults {
    /// Exact match, if any
    pub exact: Option<MatchCandidate>,
    /// Candidates per tier that ran, each in tier-internal order
    pub tiers: BTreeMap<TierKind, Vec<MatchCandidate>>,
}

impl TierResults {
    /// Candidates of one tier; empty when the tier did not run or found nothing
    pub fn tier(&self, kind: TierKind) -> &[MatchCandidate] {
        self.tiers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the phonetic fallback was evaluated
    pub fn phonetic_ran(&self) -> bool {
        self.tiers.contains_key(&TierKind::Phonetic)
    }

    /// Whether any earlier tier produced a candidate that clears its own threshold.
    ///
    /// Prefix hits count only when the matched prefix is long enough to be accepted.
    /// Similarity and pattern candidates are already filtered by their thresholds.
    fn has_qualifying_candidate(&self, config: &MatchingConfig) -> bool {
        let min_prefix = config.prefix_acceptance_min_len as f64;
        self.exact.is_some()
            || self.tier(TierKind::Prefix).iter().any(|c| c.score >= min_prefix)
            || !self.tier(TierKind::Similarity).is_empty()
            || !self.tier(TierKind::Pattern).is_empty()
    }
}

/// Levenshtein ratio on a 0-100 scale: `100 × (1 − distance / max(len a, len b))`
///
/// # Examples
///
/// ```
/// use slip_resolver::matching::similarity_ratio;
///
/// assert_eq!(similarity_ratio("crocin", "crocin"), 100.0);
/// assert_eq!(similarity_ratio("abcd", "abcx"), 75.0);
/// assert_eq!(similarity_ratio("", ""), 100.0);
/// ```
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100.0;
    }
    let distance = strsim::levenshtein(a, b);
    (100.0 * (1.0 - distance as f64 / longest as f64)).clamp(0.0, 100.0)
}

fn exact_tier(query: &str, catalog: &Catalog) -> Vec<MatchCandidate> {
    catalog
        .all()
        .iter()
        .find(|entry| entry.key() == query)
        .map(|entry| vec![MatchCandidate::new(entry.name(), TierKind::Exact, 100.0)])
        .unwrap_or_default()
}

fn prefix_hits(prefix: &str, catalog: &Catalog) -> Vec<MatchCandidate> {
    let score = prefix.chars().count() as f64;
    catalog
        .all()
        .iter()
        .filter(|entry| entry.key().starts_with(prefix))
        .map(|entry| MatchCandidate::new(entry.name(), TierKind::Prefix, score))
        .collect()
}

fn prefix_tier(query: &str, catalog: &Catalog) -> Vec<MatchCandidate> {
    let first_word = query.split_whitespace().next().unwrap_or(query);
    let hits = prefix_hits(first_word, catalog);
    if !hits.is_empty() {
        return hits;
    }

    let word_len = first_word.chars().count();
    for length in [3usize, 2, 1] {
        if length >= word_len {
            continue;
        }
        let prefix: String = query.chars().take(length).collect();
        let hits = prefix_hits(&prefix, catalog);
        if !hits.is_empty() {
            trace!(prefix = %prefix, hits = hits.len(), "Prefix tier matched on fallback prefix");
            return hits;
        }
    }

    Vec::new()
}

fn similarity_tier(query: &str, catalog: &Catalog, config: &MatchingConfig) -> Vec<MatchCandidate> {
    let mut scored: Vec<MatchCandidate> = catalog
        .all()
        .iter()
        .map(|entry| {
            MatchCandidate::new(entry.name(), TierKind::Similarity, similarity_ratio(query, entry.key()))
        })
        .filter(|candidate| candidate.score >= config.similarity_threshold)
        .collect();

    // Stable sort keeps catalog order among equal ratios.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

fn pattern_tier(query: &str, catalog: &Catalog, config: &MatchingConfig) -> Vec<MatchCandidate> {
    let query_grams = bigrams(query);
    if query_grams.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(MatchCandidate, &str)> = catalog
        .all()
        .iter()
        .filter_map(|entry| {
            let shared = query_grams.intersection(entry.bigrams()).count();
            (shared > 0).then(|| {
                (
                    MatchCandidate::new(entry.name(), TierKind::Pattern, shared as f64),
                    entry.key(),
                )
            })
        })
        .collect();

    scored.sort_by(|a, b| b.0.score.total_cmp(&a.0.score));
    scored.truncate(config.pattern_top_n);

    scored
        .into_iter()
        .filter(|(_, key)| {
            !config.enable_pattern_refinement
                || similarity_ratio(query, key) >= config.pattern_refinement_threshold
        })
        .map(|(candidate, _)| candidate)
        .collect()
}

fn phonetic_tier(query: &str, catalog: &Catalog) -> Vec<MatchCandidate> {
    let matcher = PhoneticMatcher::new();
    catalog
        .all()
        .iter()
        .filter(|entry| matcher.sounds_alike(query, entry.key()))
        .map(|entry| MatchCandidate::new(entry.name(), TierKind::Phonetic, 100.0))
        .collect()
}

/// Run the cascade for one item name.
///
/// Exact, prefix, similarity and pattern tiers always run so their output can feed
/// suggestions. The phonetic tier only runs when none of them produced a candidate
/// above its threshold, so short prefix hits alone do not suppress it.
pub fn resolve(name: &str, catalog: &Catalog, config: &MatchingConfig) -> TierResults {
    let query = normalize(name);
    let mut results = TierResults::default();

    for tier in TierKind::CASCADE {
        if tier == TierKind::Phonetic && results.has_qualifying_candidate(config) {
            trace!(query = %query, "Skipping phonetic tier");
            break;
        }

        let candidates = tier.run(&query, catalog, config);
        debug!(
            tier = %tier,
            query = %query,
            candidates = candidates.len(),
            "Matching tier evaluated"
        );
        observability::record_tier_metrics(tier.as_str(), candidates.len());

        if tier == TierKind::Exact {
            results.exact = candidates.first().cloned();
        }
        results.tiers.insert(tier, candidates);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::new(names.iter().copied())
    }

    #[test]
    fn test_matching_config_validation() {
        let mut config = MatchingConfig::default();
        assert!(config.validate().is_ok());

        config.similarity_threshold = 120.0;
        assert!(config.validate().is_err());
        config.similarity_threshold = 60.0;

        config.pattern_refinement_threshold = -1.0;
        assert!(config.validate().is_err());
        config.pattern_refinement_threshold = 50.0;

        config.pattern_top_n = 0;
        assert!(config.validate().is_err());
        config.pattern_top_n = 10;

        config.prefix_acceptance_min_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tier_priority_order() {
        assert!(TierKind::Exact < TierKind::Prefix);
        assert!(TierKind::Pattern < TierKind::Phonetic);
        assert_eq!(TierKind::CASCADE[0], TierKind::Exact);
    }

    #[test]
    fn test_exact_tier_uses_stored_case() {
        let results = resolve("CROCIN", &catalog(&["Dolo", "Crocin"]), &MatchingConfig::default());
        assert_eq!(results.exact.map(|c| c.catalog_name), Some("Crocin".to_string()));
    }

    #[test]
    fn test_prefix_tier_scores_by_prefix_length() {
        let config = MatchingConfig::default();
        let cat = catalog(&["Amoxicillin", "Amoxyclav", "Azithral"]);

        let hits = TierKind::Prefix.run("amox", &cat, &config);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|c| c.score == 4.0));

        let hits = TierKind::Prefix.run("abc", &cat, &config);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|c| c.score == 1.0));
    }

    #[test]
    fn test_prefix_fallback_tries_three_characters_first() {
        let config = MatchingConfig::default();
        let cat = catalog(&["Pantocid", "Paracetamol"]);
        let hits = TierKind::Prefix.run("parcetamol", &cat, &config);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].catalog_name, "Paracetamol");
        assert_eq!(hits[0].score, 3.0);
    }

    #[test]
    fn test_similarity_tier_threshold_and_order() {
        let config = MatchingConfig::default();
        let cat = catalog(&["Crocinn", "Crocin", "Zyrtec"]);
        let hits = TierKind::Similarity.run("crocin", &cat, &config);
        let names: Vec<&str> = hits.iter().map(|c| c.catalog_name.as_str()).collect();
        assert_eq!(names, vec!["Crocin", "Crocinn"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_pattern_tier_counts_shared_bigrams() {
        let config = MatchingConfig {
            enable_pattern_refinement: false,
            ..Default::default()
        };
        let cat = catalog(&["abxx", "abcd", "zzzz"]);
        let hits = TierKind::Pattern.run("abcd", &cat, &config);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].catalog_name, "abcd");
        assert_eq!(hits[0].score, 3.0);
        assert_eq!(hits[1].score, 1.0);
    }

    #[test]
    fn test_pattern_refinement_drops_weak_candidates() {
        let config = MatchingConfig::default();
        let cat = catalog(&["abxxxxxx"]);
        assert!(TierKind::Pattern.run("abcd", &cat, &config).is_empty());
    }

    #[test]
    fn test_phonetic_tier_only_on_exhaustion() {
        let config = MatchingConfig::default();

        let results = resolve("kwik", &catalog(&["Quick"]), &config);
        assert!(results.phonetic_ran());
        assert_eq!(results.tier(TierKind::Phonetic)[0].catalog_name, "Quick");

        let results = resolve("crocin", &catalog(&["Crocin"]), &config);
        assert!(!results.phonetic_ran());
    }

    #[test]
    fn test_short_prefix_hit_does_not_block_phonetic_tier() {
        let config = MatchingConfig::default();
        let results = resolve("Kwik", &catalog(&["Quick", "Kwality"]), &config);

        // "kw" is the only prefix hit, below the acceptance length
        assert_eq!(results.tier(TierKind::Prefix)[0].catalog_name, "Kwality");
        assert_eq!(results.tier(TierKind::Prefix)[0].score, 2.0);
        assert!(results.tier(TierKind::Similarity).is_empty());
        assert!(results.tier(TierKind::Pattern).is_empty());

        assert!(results.phonetic_ran());
        let phonetic: Vec<&str> = results
            .tier(TierKind::Phonetic)
            .iter()
            .map(|c| c.catalog_name.as_str())
            .collect();
        assert_eq!(phonetic, vec!["Quick"]);
    }

    #[test]
    fn test_accepted_prefix_length_skips_phonetic_tier() {
        let results = resolve("amox", &catalog(&["Amoxicillin"]), &MatchingConfig::default());
        assert!(!results.phonetic_ran());
    }

    #[test]
    fn test_similarity_threshold_is_inclusive() {
        let config = MatchingConfig {
            similarity_threshold: 75.0,
            ..Default::default()
        };
        let cat = catalog(&["abcx", "abxy"]);
        assert_eq!(similarity_ratio("abcd", "abcx"), 75.0);

        let hits = TierKind::Similarity.run("abcd", &cat, &config);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].catalog_name, "abcx");
        assert_eq!(hits[0].score, 75.0);
    }

    #[test]
    fn test_pattern_tier_caps_at_top_n() {
        let names: Vec<String> = (0..12).map(|i| format!("ab{}", "x".repeat(i))).collect();
        let cat = Catalog::new(names.iter().map(String::as_str));
        let config = MatchingConfig {
            enable_pattern_refinement: false,
            ..Default::default()
        };

        let hits = TierKind::Pattern.run("abcd", &cat, &config);
        assert_eq!(hits.len(), config.pattern_top_n);
        // Equal bigram counts keep catalog order
        assert_eq!(hits[0].catalog_name, "ab");
        assert_eq!(hits[9].catalog_name, names[9]);

        let narrow = MatchingConfig {
            pattern_top_n: 3,
            ..config
        };
        assert_eq!(TierKind::Pattern.run("abcd", &cat, &narrow).len(), 3);
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let results = resolve("crocin", &Catalog::default(), &MatchingConfig::default());
        assert!(results.exact.is_none());
        assert!(results.tiers.values().all(|c| c.is_empty()));
    }
}
