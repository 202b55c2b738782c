//! Access popularity
//!
//! `min(1, log10(count + 1) / 3)`: ten accesses give ~0.35, a hundred ~0.67,
//! and the score saturates at 999 accesses.

/// Access count at which popularity reaches exactly 1.0
pub const SATURATION_COUNT: i64 = 999;

/// Log-scaled popularity in [0, 1]. Negative counts are treated as zero.
pub fn popularity_score(access_count: i64) -> f64 {
    if access_count >= SATURATION_COUNT {
        return 1.0;
    }
    let count = access_count.max(0) as f64;
    ((count + 1.0).log10() / 3.0).min(1.0)
}
