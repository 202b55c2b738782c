//! Composite per-item score
//!
//! Blends five signals into one comparable number:
//!
//! | factor     | default weight | source                               |
//! |------------|----------------|--------------------------------------|
//! | similarity | 0.35           | `similarity / 100`, clamped to [0,1] |
//! | importance | 0.25           | `importance_weight` (default 0.5)    |
//! | recency    | 0.20           | [`recency_score_at`]                 |
//! | popularity | 0.10           | [`popularity_score`]                 |
//! | tier boost | 0.10           | [`ImportanceTier::tier_boost`]       |
//!
//! Each factor is in [0, 1]; the total is their weighted sum.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{CompositeWeights, ScoringConfig};
use crate::memory::types::MemoryItem;
use crate::scoring::popularity::popularity_score;
use crate::scoring::recency::{DECAY_RATE, recency_score_at};

/// One factor of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorDetail {
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

impl FactorDetail {
    fn new(value: f64, weight: f64) -> Self {
        Self {
            value,
            weight,
            contribution: value * weight,
        }
    }
}

/// Per-factor explanation of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub similarity: FactorDetail,
    pub importance: FactorDetail,
    pub recency: FactorDetail,
    pub popularity: FactorDetail,
    pub tier_boost: FactorDetail,
    pub total: f64,
}

impl ScoreBreakdown {
    /// Factors in display order
    pub fn factors(&self) -> [(&'static str, FactorDetail); 5] {
        [
            ("similarity", self.similarity),
            ("importance", self.importance),
            ("recency", self.recency),
            ("popularity", self.popularity),
            ("tier_boost", self.tier_boost),
        ]
    }
}

/// An item with its composite score attached
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: MemoryItem,
    pub composite_score: f64,
    pub scoring: ScoreBreakdown,
}

/// Weighted multi-factor scorer
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: CompositeWeights,
    decay_rate: f64,
    strict_deprecated_boost: bool,
    now: Option<DateTime<Utc>>,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self {
            weights: CompositeWeights::default(),
            decay_rate: DECAY_RATE,
            strict_deprecated_boost: false,
            now: None,
        }
    }
}

impl CompositeScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            weights: config.weights,
            decay_rate: config.decay_rate,
            strict_deprecated_boost: config.strict_deprecated_boost,
            now: None,
        }
    }

    /// Replace the factor weights. Weights are used as given; validate them
    /// with [`CompositeWeights::validate`] when they come from user input.
    pub fn with_weights(mut self, weights: CompositeWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    /// Score `deprecated` items with a tier boost of 0.0 instead of 0.5
    pub fn with_strict_deprecated_boost(mut self, strict: bool) -> Self {
        self.strict_deprecated_boost = strict;
        self
    }

    /// Pin the reference time used for recency
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn weights(&self) -> &CompositeWeights {
        &self.weights
    }

    pub fn score(&self, item: &MemoryItem) -> f64 {
        self.breakdown(item).total
    }

    pub fn breakdown(&self, item: &MemoryItem) -> ScoreBreakdown {
        let now = self.now.unwrap_or_else(Utc::now);
        let tier = item.importance_tier;

        let tier_boost = if self.strict_deprecated_boost {
            tier.strict_tier_boost()
        } else {
            tier.tier_boost()
        };

        let similarity = FactorDetail::new(similarity_factor(item.similarity), self.weights.similarity);
        let importance =
            FactorDetail::new(item.importance_weight_or_default(), self.weights.importance);
        let recency = FactorDetail::new(
            recency_score_at(item.last_touched(), tier, self.decay_rate, now),
            self.weights.recency,
        );
        let popularity = FactorDetail::new(
            popularity_score(item.access_count),
            self.weights.popularity,
        );
        let tier_boost = FactorDetail::new(tier_boost, self.weights.tier_boost);

        let total = similarity.contribution
            + importance.contribution
            + recency.contribution
            + popularity.contribution
            + tier_boost.contribution;

        ScoreBreakdown {
            similarity,
            importance,
            recency,
            popularity,
            tier_boost,
            total,
        }
    }

    /// Score every item and sort by score descending, ties by ascending id
    pub fn apply(&self, items: &[MemoryItem]) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = items
            .iter()
            .map(|item| {
                let scoring = self.breakdown(item);
                ScoredItem {
                    item: item.clone(),
                    composite_score: scoring.total,
                    scoring,
                }
            })
            .collect();

        scored.sort_by(compare_scored);

        tracing::debug!(items = scored.len(), "Applied composite scoring");
        scored
    }
}

/// Convert a 0-100 similarity into a [0, 1] factor; missing or NaN is 0
pub fn similarity_factor(similarity: Option<f64>) -> f64 {
    match similarity {
        Some(s) if s.is_finite() => (s / 100.0).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Composite score with default weights against the wall clock
pub fn score_composite(item: &MemoryItem) -> f64 {
    CompositeScorer::default().score(item)
}

/// Batch-score with default weights
pub fn apply_composite_scoring(items: &[MemoryItem]) -> Vec<ScoredItem> {
    CompositeScorer::default().apply(items)
}

/// Descending comparison of two scored items, ties broken by id
pub fn compare_scored(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| a.item.id.cmp(&b.item.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::tier::ImportanceTier;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_fresh_critical_item() {
        let item = MemoryItem::new(1, "a")
            .with_tier(ImportanceTier::Critical)
            .with_similarity(100.0)
            .with_importance_weight(1.0)
            .with_updated_at(now())
            .with_access_count(999);

        let score = CompositeScorer::new().at(now()).score(&item);
        assert!((score - 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_neutral_item() {
        // similarity 0, importance 0.5, recency 0.5 (no timestamp), popularity 0, tier 0.5
        let item = MemoryItem::new(1, "a");
        let score = CompositeScorer::new().at(now()).score(&item);
        let expected = 0.25 * 0.5 + 0.20 * 0.5 + 0.10 * 0.5;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_matches_score() {
        let item = MemoryItem::new(3, "a")
            .with_tier(ImportanceTier::Important)
            .with_similarity(72.0)
            .with_updated_at(now() - Duration::days(10))
            .with_access_count(10);
        let scorer = CompositeScorer::new().at(now());
        let breakdown = scorer.breakdown(&item);

        assert!((breakdown.similarity.value - 0.72).abs() < 1e-9);
        assert!((breakdown.recency.value - 0.5).abs() < 1e-9);
        assert_eq!(breakdown.tier_boost.value, 0.8);
        assert_eq!(breakdown.similarity.weight, 0.35);

        let summed: f64 = breakdown.factors().iter().map(|(_, f)| f.contribution).sum();
        assert!((summed - breakdown.total).abs() < 1e-12);
        assert_eq!(scorer.score(&item), breakdown.total);
    }

    #[test]
    fn test_similarity_factor_clamps() {
        assert_eq!(similarity_factor(None), 0.0);
        assert_eq!(similarity_factor(Some(f64::NAN)), 0.0);
        assert_eq!(similarity_factor(Some(150.0)), 1.0);
        assert_eq!(similarity_factor(Some(-10.0)), 0.0);
        assert_eq!(similarity_factor(Some(50.0)), 0.5);
    }

    #[test]
    fn test_deprecated_boost_modes() {
        let item = MemoryItem::new(1, "a").with_tier(ImportanceTier::Deprecated);
        let lenient = CompositeScorer::new().at(now()).breakdown(&item);
        let strict = CompositeScorer::new()
            .at(now())
            .with_strict_deprecated_boost(true)
            .breakdown(&item);
        assert_eq!(lenient.tier_boost.value, 0.5);
        assert_eq!(strict.tier_boost.value, 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let weights = CompositeWeights {
            similarity: 1.0,
            importance: 0.0,
            recency: 0.0,
            popularity: 0.0,
            tier_boost: 0.0,
        };
        let item = MemoryItem::new(1, "a").with_similarity(42.0);
        let score = CompositeScorer::new().with_weights(weights).score(&item);
        assert!((score - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_apply_sorts_with_id_tiebreak() {
        let items = vec![
            MemoryItem::new(5, "a").with_similarity(10.0),
            MemoryItem::new(2, "a").with_similarity(90.0),
            MemoryItem::new(4, "a").with_similarity(50.0),
            MemoryItem::new(3, "a").with_similarity(50.0),
        ];
        let ranked = CompositeScorer::new().at(now()).apply(&items);
        let ids: Vec<i64> = ranked.iter().map(|s| s.item.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);
        assert!(ranked.windows(2).all(|w| compare_scored(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn test_apply_empty() {
        assert!(apply_composite_scoring(&[]).is_empty());
    }
}
