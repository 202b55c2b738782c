//! Memory item model and importance tiers
//!
//! Defines the read-only view of stored memories that the scoring and
//! boosting passes operate on.

pub mod tier;
pub mod types;

pub use tier::{DEFAULT_TIER_BOOST, ImportanceTier};
pub use types::{DEFAULT_IMPORTANCE_WEIGHT, MemoryItem, parse_timestamp};
