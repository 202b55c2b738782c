//! Recency decay
//!
//! Inverse decay `1 / (1 + days * rate)`. At the default rate of 0.10 an
//! item keeps ~59% of its score after a week and 50% after ten days.
//! Constitutional items never decay.

use chrono::{DateTime, Utc};

use crate::memory::tier::ImportanceTier;

/// Default decay rate per day
pub const DECAY_RATE: f64 = 0.10;

/// Score used when an item has no usable timestamp
pub const NEUTRAL_RECENCY: f64 = 0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Recency score against the wall clock with the default decay rate
pub fn recency_score(timestamp: Option<DateTime<Utc>>, tier: ImportanceTier) -> f64 {
    recency_score_at(timestamp, tier, DECAY_RATE, Utc::now())
}

/// Recency score relative to `now`.
///
/// Returns a value in [0, 1]. Missing timestamps yield [`NEUTRAL_RECENCY`],
/// future timestamps yield 1.0, and a non-finite or non-positive decay rate
/// falls back to [`DECAY_RATE`].
pub fn recency_score_at(
    timestamp: Option<DateTime<Utc>>,
    tier: ImportanceTier,
    decay_rate: f64,
    now: DateTime<Utc>,
) -> f64 {
    if tier == ImportanceTier::Constitutional {
        return 1.0;
    }

    let Some(timestamp) = timestamp else {
        return NEUTRAL_RECENCY;
    };

    let rate = if decay_rate.is_finite() && decay_rate > 0.0 {
        decay_rate
    } else {
        DECAY_RATE
    };

    let days_since = (now - timestamp).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
    if days_since < 0.0 {
        return 1.0;
    }

    (1.0 / (1.0 + days_since * rate)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn days_ago(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
        Some(now - Duration::days(days))
    }

    #[test]
    fn test_decay_curve() {
        let now = Utc::now();
        let normal = ImportanceTier::Normal;
        let cases = [
            (0, 1.0),
            (7, 0.588),
            (10, 0.50),
            (30, 0.25),
            (90, 0.10),
            (365, 0.027),
        ];
        for (days, expected) in cases {
            let score = recency_score_at(days_ago(now, days), normal, DECAY_RATE, now);
            assert!(
                (score - expected).abs() < 0.02,
                "{days} days: expected ~{expected}, got {score}"
            );
        }
    }

    #[test]
    fn test_ten_days_is_exactly_half() {
        let now = Utc::now();
        let score = recency_score_at(days_ago(now, 10), ImportanceTier::Normal, DECAY_RATE, now);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_constitutional_is_exempt() {
        let now = Utc::now();
        for days in [0, 30, 365, 1000] {
            let score = recency_score_at(
                days_ago(now, days),
                ImportanceTier::Constitutional,
                DECAY_RATE,
                now,
            );
            assert_eq!(score, 1.0);
        }
        assert_eq!(
            recency_score_at(None, ImportanceTier::Constitutional, DECAY_RATE, now),
            1.0
        );
    }

    #[test]
    fn test_future_timestamp_scores_one() {
        let now = Utc::now();
        let future = Some(now + Duration::days(3));
        assert_eq!(
            recency_score_at(future, ImportanceTier::Normal, DECAY_RATE, now),
            1.0
        );
    }

    #[test]
    fn test_missing_timestamp_is_neutral() {
        assert_eq!(recency_score(None, ImportanceTier::Critical), NEUTRAL_RECENCY);
        assert_eq!(
            recency_score(None, ImportanceTier::Temporary),
            NEUTRAL_RECENCY
        );
    }

    #[test]
    fn test_invalid_decay_rate_uses_default() {
        let now = Utc::now();
        let ts = days_ago(now, 10);
        for rate in [f64::NAN, -1.0, 0.0, f64::INFINITY] {
            let score = recency_score_at(ts, ImportanceTier::Normal, rate, now);
            assert!((score - 0.5).abs() < 1e-9, "rate {rate} gave {score}");
        }
    }

    #[test]
    fn test_faster_decay_rate() {
        let now = Utc::now();
        let slow = recency_score_at(days_ago(now, 10), ImportanceTier::Normal, 0.1, now);
        let fast = recency_score_at(days_ago(now, 10), ImportanceTier::Normal, 0.5, now);
        assert!(fast < slow);
    }
}
