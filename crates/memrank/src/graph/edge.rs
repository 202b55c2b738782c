//! Causal edge model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// Relation carried by a causal edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Caused,
    Enabled,
    Supports,
    DerivedFrom,
    Supersedes,
    Contradicts,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::Caused,
        Relation::Enabled,
        Relation::Supports,
        Relation::DerivedFrom,
        Relation::Supersedes,
        Relation::Contradicts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Caused => "caused",
            Relation::Enabled => "enabled",
            Relation::Supports => "supports",
            Relation::DerivedFrom => "derived_from",
            Relation::Supersedes => "supersedes",
            Relation::Contradicts => "contradicts",
        }
    }

    /// Walk multiplier for traversing an edge of this relation
    pub fn multiplier(self) -> f64 {
        match self {
            Relation::Supersedes => 1.5,
            Relation::Contradicts => 0.8,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Relation::ALL
            .into_iter()
            .find(|relation| relation.as_str() == normalized)
            .ok_or_else(|| RankError::General(format!("Unknown relation: {s}")))
    }
}

/// Directed, typed link between two items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    pub source_id: i64,
    pub target_id: i64,
    pub relation: Relation,
    /// Edge strength; treated as 1.0 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl CausalEdge {
    pub fn new(source_id: i64, target_id: i64, relation: Relation) -> Self {
        Self {
            source_id,
            target_id,
            relation,
            strength: None,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Strength, defaulting to 1.0 when missing or non-finite
    pub fn strength_or_default(&self) -> f64 {
        match self.strength {
            Some(s) if s.is_finite() => s,
            _ => 1.0,
        }
    }

    /// Relation multiplier times strength
    pub fn walk_weight(&self) -> f64 {
        self.relation.multiplier() * self.strength_or_default()
    }

    /// The endpoint opposite `node`, if `node` is on this edge
    pub fn other_end(&self, node: i64) -> Option<i64> {
        if self.source_id == node {
            Some(self.target_id)
        } else if self.target_id == node {
            Some(self.source_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_multipliers() {
        assert_eq!(Relation::Supersedes.multiplier(), 1.5);
        assert_eq!(Relation::Contradicts.multiplier(), 0.8);
        assert_eq!(Relation::Caused.multiplier(), 1.0);
        assert_eq!(Relation::DerivedFrom.multiplier(), 1.0);
    }

    #[test]
    fn test_relation_parse() {
        assert_eq!("derived_from".parse::<Relation>().unwrap(), Relation::DerivedFrom);
        assert_eq!(" SUPERSEDES ".parse::<Relation>().unwrap(), Relation::Supersedes);
        assert!("blocks".parse::<Relation>().is_err());
    }

    #[test]
    fn test_edge_serde() {
        let edge: CausalEdge =
            serde_json::from_str(r#"{"source_id":1,"target_id":2,"relation":"derived_from"}"#)
                .unwrap();
        assert_eq!(edge.relation, Relation::DerivedFrom);
        assert_eq!(edge.strength_or_default(), 1.0);
    }

    #[test]
    fn test_walk_weight_and_other_end() {
        let edge = CausalEdge::new(1, 2, Relation::Supersedes).with_strength(0.5);
        assert_eq!(edge.walk_weight(), 0.75);
        assert_eq!(edge.other_end(1), Some(2));
        assert_eq!(edge.other_end(2), Some(1));
        assert_eq!(edge.other_end(3), None);

        let nan = CausalEdge::new(1, 2, Relation::Caused).with_strength(f64::NAN);
        assert_eq!(nan.walk_weight(), 1.0);
    }
}
