//! Causal graph boost
//!
//! Takes an already ranked result list, walks the causal graph from the top
//! results, and nudges connected items upward. Neighbors that were not in
//! the list are injected just below the weakest original result.
//!
//! Boosts are small and bounded:
//! - at most [`MAX_BOOST_PER_HOP`] for a direct neighbor, halved at two hops
//! - scaled by the relation-weighted walk score, clamped to [0.1, 2.0]
//! - causal plus session boost never exceeds [`MAX_COMBINED_BOOST`]
//!
//! Store failures are logged and treated as "no neighbors"; the pass never
//! fails a search.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::CausalBoostConfig;
use crate::graph::feature::{CAUSAL_BOOST_FLAG, FeatureGate};
use crate::graph::store::{EdgeStore, ItemStore};
use crate::memory::types::MemoryItem;
use crate::scoring::composite::ScoredItem;

/// Maximum traversal depth
pub const MAX_HOPS: u32 = 2;

/// Boost granted to a direct neighbor before the walk multiplier
pub const MAX_BOOST_PER_HOP: f64 = 0.05;

/// Cap on causal boost plus session boost for one result
pub const MAX_COMBINED_BOOST: f64 = 0.20;

/// Fraction of the result list used as traversal seeds
pub const SEED_FRACTION: f64 = 0.25;

/// Absolute cap on the number of seeds
pub const MAX_SEED_RESULTS: usize = 5;

const MIN_WALK_MULTIPLIER: f64 = 0.1;
const MAX_WALK_MULTIPLIER: f64 = 2.0;
const MIN_INJECTED_REFERENCE: f64 = 0.0001;
const INJECTED_BASE_FACTOR: f64 = 0.5;

/// Which field a result's ranking score was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Score,
    RrfScore,
    Similarity,
    None,
}

/// A per-query result row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrf_score: Option<f64>,
    /// Similarity on the 0-100 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Externally supplied boost already applied to this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_boost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causal_boost: Option<f64>,
    /// Score before the causal boost was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub injected_by_causal_boost: bool,
    /// Item metadata, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<MemoryItem>,
}

impl RankedResult {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_rrf_score(mut self, rrf_score: f64) -> Self {
        self.rrf_score = Some(rrf_score);
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_session_boost(mut self, boost: f64) -> Self {
        self.session_boost = Some(boost);
        self
    }

    /// Result carrying a composite score
    pub fn from_scored(scored: &ScoredItem) -> Self {
        Self {
            score: Some(scored.composite_score),
            ..Self::from_item(&scored.item)
        }
    }

    /// Result carrying only the item's own retrieval signals
    pub fn from_item(item: &MemoryItem) -> Self {
        Self {
            id: item.id,
            rrf_score: item.rrf_score,
            similarity: item.similarity,
            item: Some(item.clone()),
            ..Default::default()
        }
    }

    /// The field the ranking score comes from: `score`, then `rrf_score`,
    /// then `similarity`, skipping non-finite values
    pub fn score_source(&self) -> ScoreSource {
        if finite(self.score).is_some() {
            ScoreSource::Score
        } else if finite(self.rrf_score).is_some() {
            ScoreSource::RrfScore
        } else if finite(self.similarity).is_some() {
            ScoreSource::Similarity
        } else {
            ScoreSource::None
        }
    }

    /// Ranking score following [`score_source`](Self::score_source);
    /// similarity is divided by 100, and no usable field gives 0
    pub fn resolved_score(&self) -> f64 {
        match self.score_source() {
            ScoreSource::Score => self.score.unwrap_or(0.0),
            ScoreSource::RrfScore => self.rrf_score.unwrap_or(0.0),
            ScoreSource::Similarity => self.similarity.unwrap_or(0.0) / 100.0,
            ScoreSource::None => 0.0,
        }
    }

    fn session_boost_or_zero(&self) -> f64 {
        finite(self.session_boost).map_or(0.0, |boost| boost.max(0.0))
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Summary of one boost pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostMetadata {
    pub enabled: bool,
    pub applied: bool,
    pub boosted_count: usize,
    pub injected_count: usize,
    /// Largest capped boost given to a result that was already in the list
    pub max_boost_applied: f64,
    /// Always [`MAX_HOPS`]; a lower `causal_boost.max_hops` only shortens the walk
    pub traversal_depth: u32,
}

/// Result list and metadata returned by [`apply_causal_boost`]
#[derive(Debug, Clone)]
pub struct BoostOutcome {
    pub results: Vec<RankedResult>,
    pub metadata: BoostMetadata,
}

/// Stores and switches for one boost pass
pub struct BoostContext<'a> {
    edges: &'a dyn EdgeStore,
    items: &'a dyn ItemStore,
    enabled: bool,
    config: CausalBoostConfig,
}

impl<'a> BoostContext<'a> {
    /// Enabled context with default traversal settings
    pub fn new(edges: &'a dyn EdgeStore, items: &'a dyn ItemStore) -> Self {
        Self {
            edges,
            items,
            enabled: true,
            config: CausalBoostConfig::default(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Resolve the `causal_boost` flag through a feature gate
    pub fn with_gate(self, gate: &dyn FeatureGate, identity: Option<&str>) -> Self {
        let enabled = gate.is_enabled(CAUSAL_BOOST_FLAG, identity);
        self.with_enabled(enabled)
    }

    pub fn with_config(mut self, config: CausalBoostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn max_hops(&self) -> u32 {
        self.config.max_hops.clamp(1, MAX_HOPS)
    }

    fn seed_count(&self, result_count: usize) -> usize {
        seed_count(
            result_count,
            self.config.seed_fraction,
            self.config.max_seed_results,
        )
    }
}

/// Number of seeds for a list of `result_count` results:
/// `clamp(ceil(result_count * fraction), 1, max_seeds)`
pub fn seed_count(result_count: usize, fraction: f64, max_seeds: usize) -> usize {
    let fraction = if fraction.is_finite() && fraction > 0.0 {
        fraction
    } else {
        SEED_FRACTION
    };
    let wanted = (result_count as f64 * fraction).ceil() as usize;
    wanted.clamp(1, max_seeds.max(1))
}

/// Boost for a neighbor first reached at `hop`: 0.05 at one hop, 0.025 at two
pub fn hop_boost(hop: u32) -> f64 {
    if hop == 0 {
        return 0.0;
    }
    MAX_BOOST_PER_HOP.min(MAX_BOOST_PER_HOP / f64::from(hop))
}

/// Walk score clamped to [0.1, 2.0]; non-finite scores count as 1.0
pub fn walk_multiplier(walk_score: f64) -> f64 {
    if walk_score.is_finite() {
        walk_score.clamp(MIN_WALK_MULTIPLIER, MAX_WALK_MULTIPLIER)
    } else {
        1.0
    }
}

/// Boost per neighbor reachable from `seed_ids` within `max_hops`.
///
/// Seeds never receive a boost. A traversal failure is logged and yields an
/// empty map.
pub fn compute_neighbor_boosts(
    seed_ids: &[i64],
    edges: &dyn EdgeStore,
    max_hops: u32,
) -> BTreeMap<i64, f64> {
    let mut boosts = BTreeMap::new();

    let mut seen = HashSet::new();
    let seeds: Vec<i64> = seed_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if seeds.is_empty() {
        return boosts;
    }

    let hits = match edges.neighbors(&seeds, max_hops.min(MAX_HOPS)) {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("Causal traversal failed: {}", e);
            return boosts;
        }
    };

    for hit in hits {
        if seen.contains(&hit.node_id) {
            continue;
        }
        let boost = hop_boost(hit.min_hop) * walk_multiplier(hit.max_walk_score);
        if boost <= 0.0 {
            continue;
        }
        tracing::trace!(
            node = hit.node_id,
            hop = hit.min_hop,
            walk = hit.max_walk_score,
            boost,
            "Neighbor boost"
        );
        boosts
            .entry(hit.node_id)
            .and_modify(|current: &mut f64| *current = current.max(boost))
            .or_insert(boost);
    }

    boosts
}

/// Same as [`compute_neighbor_boosts`] with the default depth
pub fn get_neighbor_boosts(seed_ids: &[i64], edges: &dyn EdgeStore) -> BTreeMap<i64, f64> {
    compute_neighbor_boosts(seed_ids, edges, MAX_HOPS)
}

/// Boost and extend a ranked result list through the causal graph.
///
/// When the pass is disabled, the list is empty, or no neighbor is found,
/// the input comes back unchanged with `applied = false`.
pub fn apply_causal_boost(results: Vec<RankedResult>, context: &BoostContext<'_>) -> BoostOutcome {
    let mut metadata = BoostMetadata {
        enabled: context.is_enabled(),
        applied: false,
        boosted_count: 0,
        injected_count: 0,
        max_boost_applied: 0.0,
        traversal_depth: MAX_HOPS,
    };

    if !metadata.enabled || results.is_empty() {
        return BoostOutcome { results, metadata };
    }

    let seed_ids: Vec<i64> = results
        .iter()
        .take(context.seed_count(results.len()))
        .map(|result| result.id)
        .collect();

    let boosts = compute_neighbor_boosts(&seed_ids, context.edges, context.max_hops());
    tracing::debug!(
        seeds = seed_ids.len(),
        neighbors = boosts.len(),
        "Causal neighbor boosts computed"
    );
    if boosts.is_empty() {
        return BoostOutcome { results, metadata };
    }

    let existing: HashSet<i64> = results.iter().map(|result| result.id).collect();
    let injected_base = results
        .iter()
        .map(RankedResult::resolved_score)
        .fold(f64::INFINITY, f64::min)
        .max(MIN_INJECTED_REFERENCE)
        * INJECTED_BASE_FACTOR;

    let mut merged: Vec<RankedResult> = results
        .into_iter()
        .map(|mut result| {
            let Some(&boost) = boosts.get(&result.id) else {
                return result;
            };
            let allowed = boost
                .min(MAX_COMBINED_BOOST - result.session_boost_or_zero())
                .max(0.0);
            if allowed <= 0.0 {
                return result;
            }

            let base = result.resolved_score();
            result.base_score = Some(base);
            result.score = Some(base * (1.0 + allowed));
            result.causal_boost = Some(allowed);

            metadata.boosted_count += 1;
            metadata.max_boost_applied = metadata.max_boost_applied.max(allowed);
            result
        })
        .collect();

    let inject_ids: Vec<i64> = boosts
        .keys()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();

    let fetched = if inject_ids.is_empty() {
        Vec::new()
    } else {
        context.items.fetch_by_ids(&inject_ids).unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch causal neighbors: {}", e);
            Vec::new()
        })
    };

    for item in fetched {
        // Ids the store returns unasked are ignored.
        let Some(&boost) = boosts.get(&item.id) else {
            continue;
        };
        if existing.contains(&item.id) || merged.iter().any(|r| r.id == item.id) {
            continue;
        }
        let mut injected = RankedResult::from_item(&item);
        injected.base_score = Some(injected_base);
        injected.score = Some(injected_base * (1.0 + boost));
        injected.causal_boost = Some(boost);
        injected.injected_by_causal_boost = true;

        metadata.injected_count += 1;
        merged.push(injected);
    }

    metadata.applied = metadata.boosted_count > 0 || metadata.injected_count > 0;

    merged.sort_by(compare_results);

    tracing::debug!(
        boosted = metadata.boosted_count,
        injected = metadata.injected_count,
        max_boost = metadata.max_boost_applied,
        "Causal boost applied"
    );

    BoostOutcome {
        results: merged,
        metadata,
    }
}

/// Resolved score descending, ties by ascending id
pub fn compare_results(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.resolved_score()
        .total_cmp(&a.resolved_score())
        .then_with(|| a.id.cmp(&b.id))
}
