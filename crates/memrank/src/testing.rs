//! Test utilities for memrank - fixtures and failing stores
//!
//! Shared by unit and integration tests so they can build items at known
//! ages and exercise the degraded paths of the boost pass.

use chrono::{DateTime, Duration, Utc};

use crate::error::{RankError, Result};
use crate::graph::edge::{CausalEdge, Relation};
use crate::graph::store::{EdgeStore, InMemoryGraphStore, ItemStore, NeighborHit};
use crate::memory::tier::ImportanceTier;
use crate::memory::types::MemoryItem;

/// Fixed reference time for deterministic recency: 2025-06-01T12:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_748_779_200, 0).unwrap_or_default()
}

/// Item last updated `age_days` before `now`
pub fn item_aged(
    id: i64,
    folder: &str,
    tier: ImportanceTier,
    age_days: i64,
    now: DateTime<Utc>,
) -> MemoryItem {
    MemoryItem::new(id, folder)
        .with_tier(tier)
        .with_updated_at(now - Duration::days(age_days))
}

/// In-memory graph with the given edges and a placeholder item per endpoint
pub fn graph_with_edges(edges: &[(i64, i64, Relation)]) -> InMemoryGraphStore {
    let mut store = InMemoryGraphStore::new();
    for &(source, target, relation) in edges {
        for id in [source, target] {
            let item = MemoryItem::new(id, "specs/graph").with_title(format!("Memory {id}"));
            store.insert_item(item);
        }
        store.link(CausalEdge::new(source, target, relation));
    }
    store
}

/// Store whose every query fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl EdgeStore for FailingStore {
    fn neighbors(&self, _origin_ids: &[i64], _max_hops: u32) -> Result<Vec<NeighborHit>> {
        Err(RankError::Storage("edge store unavailable".to_string()))
    }
}

impl ItemStore for FailingStore {
    fn fetch_by_ids(&self, _ids: &[i64]) -> Result<Vec<MemoryItem>> {
        Err(RankError::Storage("item store unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_now() {
        assert_eq!(fixed_now().to_rfc3339(), "2025-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_graph_with_edges_inserts_endpoints() {
        let store = graph_with_edges(&[(1, 2, Relation::Caused), (2, 3, Relation::Supports)]);
        assert_eq!(store.item_count(), 3);
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn test_failing_store() {
        assert!(FailingStore.neighbors(&[1], 2).is_err());
        assert!(FailingStore.fetch_by_ids(&[1]).is_err());
    }
}
