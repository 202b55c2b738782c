//! memrank - ranking engine for memory-augmented assistants
//!
//! Turns raw retrieval signals (similarity, importance, recency, access
//! popularity) into a single composite score per item, aggregates items into
//! folder scores, and re-ranks result lists through a causal relationship
//! graph between items.

pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod scoring;
pub mod testing;

pub use error::RankError;
