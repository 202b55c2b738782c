//! Causal graph: edge model, store interfaces and the boost pass

pub mod boost;
pub mod edge;
pub mod feature;
pub mod sqlite;
pub mod store;

pub use boost::{
    BoostContext, BoostMetadata, BoostOutcome, MAX_BOOST_PER_HOP, MAX_COMBINED_BOOST, MAX_HOPS,
    MAX_SEED_RESULTS, RankedResult, SEED_FRACTION, ScoreSource, apply_causal_boost,
    compute_neighbor_boosts, get_neighbor_boosts,
};
pub use edge::{CausalEdge, Relation};
pub use feature::{CAUSAL_BOOST_FLAG, ConfigFeatureGate, FeatureGate, StaticFeatureGate};
pub use sqlite::SqliteGraphStore;
pub use store::{EdgeStore, InMemoryGraphStore, ItemStore, NeighborHit};
