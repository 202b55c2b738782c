//! Integration tests for tier policy, recency, popularity and composite scoring

use chrono::Duration;

use memrank::config::{CompositeWeights, Config};
use memrank::memory::tier::ImportanceTier;
use memrank::memory::types::MemoryItem;
use memrank::scoring::composite::{CompositeScorer, apply_composite_scoring, score_composite};
use memrank::scoring::popularity::popularity_score;
use memrank::scoring::recency::{DECAY_RATE, recency_score_at};
use memrank::testing::{fixed_now, item_aged};

mod decay_tests {
    use super::*;

    #[test]
    fn test_reference_points() {
        let now = fixed_now();
        let cases = [(0, 1.0), (7, 0.588), (10, 0.5), (30, 0.25), (90, 0.10), (365, 0.027)];
        for (days, expected) in cases {
            let ts = Some(now - Duration::days(days));
            let score = recency_score_at(ts, ImportanceTier::Normal, DECAY_RATE, now);
            assert!(
                (score - expected).abs() < 0.02,
                "{days}d: expected {expected}, got {score}"
            );
        }
    }

    #[test]
    fn test_constitutional_never_decays() {
        let now = fixed_now();
        let ts = Some(now - Duration::days(1000));
        assert_eq!(
            recency_score_at(ts, ImportanceTier::Constitutional, DECAY_RATE, now),
            1.0
        );
    }

    #[test]
    fn test_popularity_reference_points() {
        assert_eq!(popularity_score(0), 0.0);
        assert!((popularity_score(1) - 0.1).abs() < 0.01);
        assert!((popularity_score(10) - 0.347).abs() < 0.01);
        assert!((popularity_score(100) - 0.668).abs() < 0.01);
        assert_eq!(popularity_score(1000), 1.0);
        assert_eq!(popularity_score(10_000), 1.0);
    }
}

mod tier_tests {
    use super::*;

    #[test]
    fn test_unknown_tiers_normalize_to_normal() {
        for raw in ["", "   ", "urgent", "NORMAL", "Normal"] {
            assert_eq!(ImportanceTier::normalize(raw), ImportanceTier::Normal, "{raw:?}");
        }
        assert_eq!(ImportanceTier::normalize(" Critical "), ImportanceTier::Critical);
    }

    #[test]
    fn test_is_valid_is_strict() {
        assert!(ImportanceTier::is_valid("critical"));
        assert!(!ImportanceTier::is_valid("Critical"));
        assert!(!ImportanceTier::is_valid("urgent"));
    }

    #[test]
    fn test_tier_tables() {
        let boosts: Vec<f64> = ImportanceTier::ALL.iter().map(|t| t.tier_boost()).collect();
        assert_eq!(boosts, vec![1.0, 1.0, 0.8, 0.5, 0.3, 0.5]);

        let multipliers: Vec<f64> = ImportanceTier::ALL
            .iter()
            .map(|t| t.search_multiplier())
            .collect();
        assert_eq!(multipliers, vec![1.0, 1.0, 0.8, 0.5, 0.3, 0.1]);
    }
}

mod composite_tests {
    use super::*;

    #[test]
    fn test_score_composite_is_bounded_for_typical_items() {
        let item = MemoryItem::new(1, "specs/a")
            .with_similarity(250.0)
            .with_importance_weight(4.0)
            .with_access_count(-3);
        let score = score_composite(&item);
        assert!((0.0..=1.0).contains(&score), "got {score}");
    }

    #[test]
    fn test_fresher_item_wins_all_else_equal() {
        let now = fixed_now();
        let fresh = item_aged(1, "a", ImportanceTier::Normal, 1, now).with_similarity(60.0);
        let stale = item_aged(2, "a", ImportanceTier::Normal, 60, now).with_similarity(60.0);
        let scorer = CompositeScorer::new().at(now);
        assert!(scorer.score(&fresh) > scorer.score(&stale));
    }

    #[test]
    fn test_breakdown_is_explanatory_only() {
        let now = fixed_now();
        let item = item_aged(1, "a", ImportanceTier::Temporary, 3, now)
            .with_similarity(77.0)
            .with_access_count(12);
        let scorer = CompositeScorer::new().at(now);
        let before = scorer.score(&item);
        let breakdown = scorer.breakdown(&item);
        assert_eq!(scorer.score(&item), before);
        assert_eq!(breakdown.total, before);
        assert_eq!(breakdown.tier_boost.value, 0.3);
        assert_eq!(breakdown.popularity.weight, 0.10);
    }

    #[test]
    fn test_config_driven_scorer() {
        let config = Config::from_toml_str(
            r#"
[scoring]
strict_deprecated_boost = true

[scoring.weights]
similarity = 0.0
importance = 0.0
recency = 0.0
popularity = 0.0
tier_boost = 1.0
"#,
        )
        .expect("config should parse");

        let scorer = CompositeScorer::from_config(&config.scoring);
        let deprecated = MemoryItem::new(1, "a").with_tier(ImportanceTier::Deprecated);
        let critical = MemoryItem::new(2, "a").with_tier(ImportanceTier::Critical);
        assert_eq!(scorer.score(&deprecated), 0.0);
        assert_eq!(scorer.score(&critical), 1.0);
    }

    #[test]
    fn test_apply_composite_scoring_orders_results() {
        let now = fixed_now();
        let items = vec![
            item_aged(1, "a", ImportanceTier::Temporary, 40, now).with_similarity(20.0),
            item_aged(2, "a", ImportanceTier::Critical, 0, now).with_similarity(90.0),
            item_aged(3, "a", ImportanceTier::Normal, 5, now).with_similarity(60.0),
        ];
        let ranked = CompositeScorer::new().at(now).apply(&items);
        let ids: Vec<i64> = ranked.iter().map(|s| s.item.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(ranked.iter().all(|s| s.composite_score == s.scoring.total));
    }

    #[test]
    fn test_apply_composite_scoring_empty() {
        assert!(apply_composite_scoring(&[]).is_empty());
    }

    #[test]
    fn test_weights_validation() {
        let bad = CompositeWeights {
            similarity: 0.5,
            ..CompositeWeights::default()
        };
        assert!(bad.validate().is_err());
        assert!(CompositeWeights::default().validate().is_ok());
    }
}
