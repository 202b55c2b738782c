//! Store interfaces consumed by the booster, plus an in-memory implementation
//!
//! The booster never holds a store of its own. Callers pass an [`EdgeStore`]
//! and an [`ItemStore`] in through [`BoostContext`](super::boost::BoostContext).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::Result;
use crate::graph::edge::CausalEdge;
use crate::memory::types::MemoryItem;

/// Aggregated reachability of one node from a set of origins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborHit {
    pub node_id: i64,
    /// Shortest hop distance from any origin
    pub min_hop: u32,
    /// Largest product of edge weights along any path reaching the node
    pub max_walk_score: f64,
}

/// Graph traversal primitive
pub trait EdgeStore: Send + Sync {
    /// Nodes reachable from `origin_ids` within `max_hops`, treating edges as
    /// undirected. Origins themselves are never returned.
    fn neighbors(&self, origin_ids: &[i64], max_hops: u32) -> Result<Vec<NeighborHit>>;
}

/// Item metadata lookup
pub trait ItemStore: Send + Sync {
    /// Items for the given ids; unknown ids are skipped
    fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<MemoryItem>>;
}

/// Items and edges held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    items: BTreeMap<i64, MemoryItem>,
    edges: Vec<CausalEdge>,
    adjacency: HashMap<i64, Vec<usize>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(items: Vec<MemoryItem>, edges: Vec<CausalEdge>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.insert_item(item);
        }
        for edge in edges {
            store.link(edge);
        }
        store
    }

    /// Insert or replace an item
    pub fn insert_item(&mut self, item: MemoryItem) {
        self.items.insert(item.id, item);
    }

    /// Add an edge
    pub fn link(&mut self, edge: CausalEdge) {
        let index = self.edges.len();
        self.adjacency.entry(edge.source_id).or_default().push(index);
        if edge.target_id != edge.source_id {
            self.adjacency.entry(edge.target_id).or_default().push(index);
        }
        self.edges.push(edge);
    }

    pub fn edges(&self) -> &[CausalEdge] {
        &self.edges
    }

    pub fn items(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn incident_edges(&self, node: i64) -> impl Iterator<Item = &CausalEdge> {
        self.adjacency
            .get(&node)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
    }
}

struct PathState {
    node: i64,
    walk: f64,
    path: Vec<i64>,
}

impl EdgeStore for InMemoryGraphStore {
    fn neighbors(&self, origin_ids: &[i64], max_hops: u32) -> Result<Vec<NeighborHit>> {
        let origins: HashSet<i64> = origin_ids.iter().copied().collect();
        let mut hits: BTreeMap<i64, NeighborHit> = BTreeMap::new();

        for &origin in &origins {
            // Level-by-level walk over simple paths; a path never revisits a
            // node it already holds, which also keeps it off its origin.
            let mut frontier = vec![PathState {
                node: origin,
                walk: 1.0,
                path: vec![origin],
            }];

            for hop in 1..=max_hops {
                let mut next_frontier = Vec::new();

                for state in &frontier {
                    for edge in self.incident_edges(state.node) {
                        let Some(next) = edge.other_end(state.node) else {
                            continue;
                        };
                        if state.path.contains(&next) {
                            continue;
                        }

                        let walk = state.walk * edge.walk_weight();

                        if !origins.contains(&next) {
                            hits.entry(next)
                                .and_modify(|hit| {
                                    hit.min_hop = hit.min_hop.min(hop);
                                    hit.max_walk_score = hit.max_walk_score.max(walk);
                                })
                                .or_insert(NeighborHit {
                                    node_id: next,
                                    min_hop: hop,
                                    max_walk_score: walk,
                                });
                        }

                        let mut path = state.path.clone();
                        path.push(next);
                        next_frontier.push(PathState {
                            node: next,
                            walk,
                            path,
                        });
                    }
                }

                tracing::trace!(
                    origin,
                    hop,
                    paths = next_frontier.len(),
                    "Expanded traversal level"
                );

                if next_frontier.is_empty() {
                    break;
                }
                frontier = next_frontier;
            }
        }

        Ok(hits.into_values().collect())
    }
}

impl ItemStore for InMemoryGraphStore {
    fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<MemoryItem>> {
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.items.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::Relation;

    fn hit(hits: &[NeighborHit], id: i64) -> Option<NeighborHit> {
        hits.iter().copied().find(|h| h.node_id == id)
    }

    #[test]
    fn test_neighbors_chain() {
        let store = InMemoryGraphStore::from_parts(
            vec![],
            vec![
                CausalEdge::new(1, 2, Relation::Caused),
                CausalEdge::new(2, 3, Relation::Supports),
                CausalEdge::new(3, 4, Relation::Caused),
            ],
        );

        let hits = store.neighbors(&[1], 2).unwrap();
        assert_eq!(hit(&hits, 2).unwrap().min_hop, 1);
        assert_eq!(hit(&hits, 3).unwrap().min_hop, 2);
        assert!(hit(&hits, 4).is_none());
        assert!(hit(&hits, 1).is_none());
    }

    #[test]
    fn test_neighbors_are_bidirectional() {
        let edges = vec![CausalEdge::new(5, 1, Relation::DerivedFrom)];
        let store = InMemoryGraphStore::from_parts(vec![], edges);
        let hits = store.neighbors(&[1], 2).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, 5);
    }

    #[test]
    fn test_walk_score_is_max_product() {
        let store = InMemoryGraphStore::from_parts(
            vec![],
            vec![
                CausalEdge::new(1, 2, Relation::Contradicts),
                CausalEdge::new(1, 3, Relation::Supersedes),
                CausalEdge::new(3, 2, Relation::Supersedes),
            ],
        );
        let hits = store.neighbors(&[1], 2).unwrap();
        let two = hit(&hits, 2).unwrap();
        assert_eq!(two.min_hop, 1);
        assert!((two.max_walk_score - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_terminates() {
        let store = InMemoryGraphStore::from_parts(
            vec![],
            vec![
                CausalEdge::new(1, 2, Relation::Caused),
                CausalEdge::new(2, 1, Relation::Caused),
                CausalEdge::new(2, 2, Relation::Caused),
            ],
        );
        let hits = store.neighbors(&[1], 2).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, 2);
        assert_eq!(hits[0].min_hop, 1);
    }

    #[test]
    fn test_other_origins_are_excluded_but_traversable() {
        let store = InMemoryGraphStore::from_parts(
            vec![],
            vec![
                CausalEdge::new(1, 2, Relation::Caused),
                CausalEdge::new(2, 3, Relation::Caused),
            ],
        );
        let hits = store.neighbors(&[1, 2], 2).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.node_id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(hits[0].min_hop, 1);
    }

    #[test]
    fn test_fetch_by_ids_skips_unknown_and_duplicates() {
        let store = InMemoryGraphStore::from_parts(
            vec![MemoryItem::new(1, "a"), MemoryItem::new(2, "b")],
            vec![],
        );
        let items = store.fetch_by_ids(&[2, 9, 2, 1]).unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
